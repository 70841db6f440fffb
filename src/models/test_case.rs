//! Test cases and the tests that attach them to runs.

use serde::{Deserialize, Serialize};

/// A test case definition in a suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<i64>,
}

/// The association of one case with one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Test {
    pub id: i64,
    pub case_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<i64>,
    /// Latest status recorded for this test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<i32>,
    #[serde(default)]
    pub title: String,
}
