//! Results to submit and the per-batch result table.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A pending result: remote status id plus comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusComment {
    pub status_id: i32,
    pub comment: String,
}

impl StatusComment {
    pub fn new(status_id: i32, comment: impl Into<String>) -> Self {
        StatusComment {
            status_id,
            comment: comment.into(),
        }
    }
}

/// One element of an `add_results_for_cases` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultForCase {
    pub case_id: i64,
    pub status_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Request body for `add_results_for_cases`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsForCases {
    pub results: Vec<ResultForCase>,
}

impl ResultsForCases {
    /// Build the batch body from a table row, in case id order.
    pub fn from_row(row: &BTreeMap<i64, StatusComment>) -> Self {
        ResultsForCases {
            results: row
                .iter()
                .map(|(case_id, result)| ResultForCase {
                    case_id: *case_id,
                    status_id: result.status_id,
                    comment: Some(result.comment.clone()),
                })
                .collect(),
        }
    }
}

/// Request body for `add_result` (single test).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResult {
    pub status_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl From<StatusComment> for NewResult {
    fn from(value: StatusComment) -> Self {
        NewResult {
            status_id: value.status_id,
            comment: Some(value.comment),
            elapsed: None,
            version: None,
        }
    }
}

/// A result record as stored by TestRail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: i64,
    pub test_id: i64,
    #[serde(default)]
    pub status_id: Option<i32>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Pending results keyed by run name, then case id.
///
/// Each cell holds exactly one result; a later insert for the same
/// (run, case) replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    rows: BTreeMap<String, BTreeMap<i64, StatusComment>>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a result, returning the one it replaced.
    pub fn insert(
        &mut self,
        run_name: impl Into<String>,
        case_id: i64,
        result: StatusComment,
    ) -> Option<StatusComment> {
        self.rows
            .entry(run_name.into())
            .or_default()
            .insert(case_id, result)
    }

    pub fn get(&self, run_name: &str, case_id: i64) -> Option<&StatusComment> {
        self.rows.get(run_name).and_then(|row| row.get(&case_id))
    }

    pub fn row(&self, run_name: &str) -> Option<&BTreeMap<i64, StatusComment>> {
        self.rows.get(run_name)
    }

    pub fn run_names(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Every case id present in any row.
    pub fn case_ids(&self) -> BTreeSet<i64> {
        self.rows.values().flat_map(|row| row.keys().copied()).collect()
    }

    /// Remove the given case ids from every row.
    pub fn remove_cases(&mut self, case_ids: &BTreeSet<i64>) {
        for row in self.rows.values_mut() {
            row.retain(|case_id, _| !case_ids.contains(case_id));
        }
    }

    /// Whether no row holds any result.
    pub fn is_empty(&self) -> bool {
        self.rows.values().all(BTreeMap::is_empty)
    }

    pub fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }
}
