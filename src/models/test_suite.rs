//! Projects and test suites.

use serde::{Deserialize, Serialize};

/// A TestRail project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    /// Completed projects are archived and reject new results
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite_mode: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A test suite within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suite {
    pub id: i64,
    pub name: String,
    pub project_id: i64,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
