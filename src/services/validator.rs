//! Validation of uploader parameters against the TestRail account.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::error::{TestRailError, TestRailResult};
use crate::gateway::TestRailClient;
use crate::models::case_id::{extract_case_id, is_blank, validate_case_id};
use crate::models::{Project, Suite};
use crate::services::status_map::{self, StatusMap};

/// Checks project, suite, plan, run and case identifiers.
#[derive(Clone)]
pub struct ParamValidator {
    client: TestRailClient,
}

impl ParamValidator {
    pub fn new(client: TestRailClient) -> Self {
        Self { client }
    }

    /// Fetch a project and require it to be open.
    pub async fn validate_project(&self, project_id: i64) -> TestRailResult<Project> {
        let project = self.client.get_project(project_id).await?;
        if project.is_completed {
            return Err(TestRailError::AccessDenied(format!(
                "TestRail project {} is completed.",
                project_id
            )));
        }
        Ok(project)
    }

    /// Fetch a suite and require it to be open and to belong to the project.
    pub async fn validate_suite(&self, suite_id: i64, project_id: i64) -> TestRailResult<Suite> {
        let suite = self.client.get_test_suite(suite_id).await?;
        if suite.is_completed {
            return Err(TestRailError::AccessDenied(format!(
                "TestRail suite {} is marked as completed",
                suite_id
            )));
        }
        if suite.project_id != project_id {
            return Err(TestRailError::AccessDenied(format!(
                "TestRail suite {} belongs to project {}, not project {}",
                suite_id, suite.project_id, project_id
            )));
        }
        Ok(suite)
    }

    /// Check every basic parameter, then the project and suite themselves.
    ///
    /// All basic violations are reported together in one `BadRequest`.
    pub async fn validate_params(
        &self,
        project_id: Option<i64>,
        suite_id: Option<i64>,
        plan_name: Option<&str>,
        run_name: Option<&str>,
    ) -> TestRailResult<()> {
        let mut errors = Vec::new();

        if plan_name.is_none_or(is_blank) {
            errors.push(format!("Invalid plan name: {:?}", plan_name.unwrap_or_default()));
        }
        if run_name.is_none_or(is_blank) {
            errors.push(format!("Invalid run name: {:?}", run_name.unwrap_or_default()));
        }
        let project_id = match project_id {
            Some(id) if id >= 0 => Some(id),
            other => {
                errors.push(format!("Invalid project id: {}", display_id(other)));
                None
            }
        };
        let suite_id = match suite_id {
            Some(id) if id >= 0 => Some(id),
            other => {
                errors.push(format!("Invalid suite id: {}", display_id(other)));
                None
            }
        };

        if !errors.is_empty() {
            return Err(TestRailError::BadRequest(errors.join(", ")));
        }

        if let (Some(project_id), Some(suite_id)) = (project_id, suite_id) {
            self.validate_project(project_id).await?;
            self.validate_suite(suite_id, project_id).await?;
        }
        Ok(())
    }

    /// Compare a status map with the account's current statuses.
    pub async fn verify_result_status_codes(&self, map: &StatusMap) -> TestRailResult<Vec<String>> {
        let statuses = self.client.get_custom_statuses().await?;
        Ok(status_map::verify(map, &statuses))
    }

    /// Validate parameters and, when given, the status map.
    ///
    /// Returns the advisory status warnings; invalid parameters are errors.
    pub async fn validate_configuration(
        &self,
        project_id: Option<i64>,
        suite_id: Option<i64>,
        plan_name: Option<&str>,
        run_name: Option<&str>,
        map: Option<&StatusMap>,
    ) -> TestRailResult<Vec<String>> {
        self.validate_params(project_id, suite_id, plan_name, run_name)
            .await?;

        let Some(map) = map else {
            return Ok(Vec::new());
        };
        let warnings = self.verify_result_status_codes(map).await?;
        for warning in &warnings {
            warn!("{}", warning);
        }
        Ok(warnings)
    }

    /// Require every non-blank token to be a case id of the suite.
    ///
    /// The suite's cases are fetched once. Fails on the first malformed
    /// token, then on the first well-formed token with no matching case.
    pub async fn validate_case_ids<'a, I>(
        &self,
        project_id: i64,
        suite_id: i64,
        tokens: I,
    ) -> TestRailResult<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known: BTreeSet<i64> = self.client.get_case_ids(project_id, suite_id).await?;
        debug!("Suite {} has {} cases", suite_id, known.len());

        for token in tokens {
            if is_blank(token) {
                continue;
            }
            if !validate_case_id(token) {
                return Err(TestRailError::CaseId(format!(
                    "Test case ID {} is invalid",
                    token
                )));
            }
            match extract_case_id(token) {
                Some(id) if known.contains(&id) => {}
                _ => {
                    return Err(TestRailError::CaseId(format!(
                        "Test case ID {} has no matching case in TestRail",
                        token
                    )));
                }
            }
        }
        Ok(())
    }
}

fn display_id(id: Option<i64>) -> String {
    id.map_or_else(|| "null".to_string(), |id| id.to_string())
}
