//! Test plans, plan entries and runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A TestRail test plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub is_completed: bool,
    /// Creation time (unix seconds on the wire)
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Only present when the full plan is fetched by id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<PlanEntry>>,
}

impl Plan {
    /// Iterate over the runs of every entry, in entry order.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.entries.iter().flatten().flat_map(|e| e.runs.iter())
    }

    /// First open run with exactly this name, with the entry holding it.
    pub fn find_open_run(&self, name: &str) -> Option<(&PlanEntry, &Run)> {
        self.entries.iter().flatten().find_map(|entry| {
            entry
                .runs
                .iter()
                .find(|r| !r.is_completed && r.name == name)
                .map(|run| (entry, run))
        })
    }
}

/// A named group of runs sharing one suite within a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Entry ids are opaque strings, unlike plan and run ids
    pub id: String,
    pub suite_id: i64,
    pub name: String,
    #[serde(default)]
    pub include_all: bool,
    #[serde(default)]
    pub runs: Vec<Run>,
}

/// A test run inside a plan entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: i64,
    pub suite_id: i64,
    pub name: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_all: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Request body for `add_plan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlan {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewPlan {
    pub fn new(name: impl Into<String>) -> Self {
        NewPlan {
            name: name.into(),
            description: None,
        }
    }
}

/// Request body for `add_plan_entry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlanEntry {
    pub suite_id: i64,
    pub name: String,
    pub include_all: bool,
    pub case_ids: Vec<i64>,
}

/// Partial update for `update_plan_entry`; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanEntryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_all: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_ids: Option<Vec<i64>>,
}

impl PlanEntryUpdate {
    /// Update that only replaces the case membership.
    pub fn case_ids(case_ids: impl IntoIterator<Item = i64>) -> Self {
        PlanEntryUpdate {
            case_ids: Some(case_ids.into_iter().collect()),
            ..Default::default()
        }
    }
}
