//! Local result statuses and the TestRail status records they map onto.

use serde::{Deserialize, Serialize};

/// Local test execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    NotRun,
    InProgress,
    Passed,
    Failed,
    Skipped,
    Canceled,
    Error,
}

impl ResultStatus {
    /// Statuses that represent a finished test and can be reported to TestRail.
    pub const ALL_COMPLETE: [ResultStatus; 5] = [
        Self::Passed,
        Self::Failed,
        Self::Skipped,
        Self::Canceled,
        Self::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotRun => "NOT_RUN",
            Self::InProgress => "IN_PROGRESS",
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
            Self::Canceled => "CANCELED",
            Self::Error => "ERROR",
        }
    }

    /// Parse from string representation, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "NOT_RUN" => Some(Self::NotRun),
            "IN_PROGRESS" => Some(Self::InProgress),
            "PASSED" => Some(Self::Passed),
            "FAILED" => Some(Self::Failed),
            "SKIPPED" => Some(Self::Skipped),
            "CANCELED" | "CANCELLED" => Some(Self::Canceled),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        Self::ALL_COMPLETE.contains(self)
    }
}

impl std::fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A result status configured on the TestRail account (`get_statuses`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub id: i32,
    /// Internal system name
    pub name: String,
    /// Display value used by the UI
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub is_untested: bool,
    #[serde(default)]
    pub is_final: bool,
}

impl Status {
    pub fn new(id: i32, name: &str) -> Self {
        Status {
            id,
            name: name.to_string(),
            label: name.to_string(),
            is_system: false,
            is_untested: false,
            is_final: false,
        }
    }
}
