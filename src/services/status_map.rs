//! Mapping from local result statuses to TestRail status ids.

use std::collections::{BTreeSet, HashMap};

use tracing::warn;

use crate::config::StatusNames;
use crate::error::StatusMappingError;
use crate::models::{ResultStatus, Status};

/// TestRail's built-in status ids.
pub const PASSED: i32 = 1;
pub const BLOCKED: i32 = 2;
/// Passive default of a test without results; TestRail rejects it as a result status.
pub const UNTESTED: i32 = 3;
pub const RETEST: i32 = 4;
pub const FAILED: i32 = 5;

/// Per-status overrides; unset statuses use the default id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusOverrides {
    pub passed: Option<i32>,
    pub failed: Option<i32>,
    pub skipped: Option<i32>,
    pub error: Option<i32>,
    pub canceled: Option<i32>,
}

/// Remote status id for each reportable local status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMap {
    pub passed: i32,
    pub failed: i32,
    pub skipped: i32,
    pub error: i32,
    pub canceled: i32,
}

impl Default for StatusMap {
    fn default() -> Self {
        Self::build(&StatusOverrides::default())
    }
}

impl StatusMap {
    /// Default remote id for a local status, `None` for statuses never reported.
    pub fn default_status(status: ResultStatus) -> Option<i32> {
        match status {
            ResultStatus::Passed => Some(PASSED),
            ResultStatus::Failed => Some(FAILED),
            ResultStatus::Skipped | ResultStatus::Canceled | ResultStatus::Error => Some(BLOCKED),
            ResultStatus::NotRun | ResultStatus::InProgress => None,
        }
    }

    /// Build a map where each override wins over the default.
    pub fn build(overrides: &StatusOverrides) -> Self {
        let map = StatusMap {
            passed: overrides.passed.unwrap_or(PASSED),
            failed: overrides.failed.unwrap_or(FAILED),
            skipped: overrides.skipped.unwrap_or(BLOCKED),
            error: overrides.error.unwrap_or(BLOCKED),
            canceled: overrides.canceled.unwrap_or(BLOCKED),
        };
        map.warn_on_shared_ids();
        map
    }

    /// Resolve configured status names against the account's statuses.
    ///
    /// Names are compared lower-cased and trimmed. Two account statuses with
    /// the same normalized name make every lookup ambiguous and are rejected.
    pub fn from_account_names(
        names: &StatusNames,
        statuses: &[Status],
    ) -> Result<Self, StatusMappingError> {
        let mut by_name: HashMap<String, i32> = HashMap::new();
        for status in statuses {
            let key = normalize(&status.name);
            if let Some(first_id) = by_name.insert(key.clone(), status.id) {
                return Err(StatusMappingError::DuplicateStatusName {
                    name: key,
                    first_id,
                    second_id: status.id,
                });
            }
        }

        let resolve = |label: &'static str, name: &str| -> Result<i32, StatusMappingError> {
            by_name
                .get(&normalize(name))
                .copied()
                .ok_or_else(|| StatusMappingError::StatusNotFound {
                    label,
                    name: name.to_string(),
                })
        };

        Ok(Self::build(&StatusOverrides {
            passed: Some(resolve("passed", &names.passed)?),
            failed: Some(resolve("failed", &names.failed)?),
            skipped: Some(resolve("skipped", &names.skipped)?),
            error: Some(resolve("error", &names.error)?),
            canceled: Some(resolve("canceled", &names.canceled)?),
        }))
    }

    /// Remote id for a local status.
    pub fn get_status(&self, status: ResultStatus) -> Result<i32, StatusMappingError> {
        match status {
            ResultStatus::Passed => Ok(self.passed),
            ResultStatus::Failed => Ok(self.failed),
            ResultStatus::Skipped => Ok(self.skipped),
            ResultStatus::Error => Ok(self.error),
            ResultStatus::Canceled => Ok(self.canceled),
            ResultStatus::NotRun | ResultStatus::InProgress => {
                Err(StatusMappingError::NoMapping(status))
            }
        }
    }

    pub fn entries(&self) -> [(ResultStatus, i32); 5] {
        [
            (ResultStatus::Passed, self.passed),
            (ResultStatus::Failed, self.failed),
            (ResultStatus::Skipped, self.skipped),
            (ResultStatus::Error, self.error),
            (ResultStatus::Canceled, self.canceled),
        ]
    }

    /// Distinct remote ids used by the map.
    pub fn status_ids(&self) -> BTreeSet<i32> {
        self.entries().iter().map(|(_, id)| *id).collect()
    }

    // Skipped, error and canceled commonly share one id; passed and failed should not.
    fn warn_on_shared_ids(&self) {
        for (status, id) in self.entries() {
            let shared: Vec<ResultStatus> = self
                .entries()
                .iter()
                .filter(|(other, other_id)| *other != status && *other_id == id)
                .map(|(other, _)| *other)
                .collect();
            if matches!(status, ResultStatus::Passed | ResultStatus::Failed) && !shared.is_empty()
            {
                warn!(
                    "TestRail status id {} is mapped to {} and also to {:?}",
                    id, status, shared
                );
            }
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Check a map against the account's statuses; returns advisory warnings.
pub fn verify(map: &StatusMap, statuses: &[Status]) -> Vec<String> {
    let account_ids: BTreeSet<i32> = statuses.iter().map(|s| s.id).collect();
    let configured = map.status_ids();
    let mut warnings = Vec::new();

    let unknown: Vec<i32> = configured.difference(&account_ids).copied().collect();
    if !unknown.is_empty() {
        warnings.push(format!(
            "Configured TestRail status codes {:?} do not match the account's status codes {:?}",
            unknown, account_ids
        ));
    }

    if configured.contains(&UNTESTED) {
        warnings.push(format!(
            "Configured TestRail status codes use invalid status code {} (Untested), \
             which TestRail does not accept for results",
            UNTESTED
        ));
    }

    warnings
}
