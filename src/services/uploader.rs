//! Upload facade: one-time setup, then repeated batch uploads.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{ProjectSettings, SyncConfig};
use crate::error::UploaderError;
use crate::gateway::TestRailClient;
use crate::models::case_id::{extract_case_id, is_blank};
use crate::models::{ResultStatus, ResultTable, StatusComment};
use crate::services::reconcile::{ReconcileRequest, ResultLogger};
use crate::services::status_map::{self, StatusMap};
use crate::services::validator::ParamValidator;

/// A locally produced test result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Case id token, e.g. `C123` or `123`
    pub test_case_id: String,
    pub status: ResultStatus,
    #[serde(default)]
    pub comment: String,
}

impl UploadResult {
    pub fn new(test_case_id: &str, status: ResultStatus, comment: &str) -> Self {
        UploadResult {
            test_case_id: test_case_id.to_string(),
            status,
            comment: comment.to_string(),
        }
    }
}

/// Uploads result batches into one plan and run.
pub struct ResultUploader {
    project: ProjectSettings,
    status_map: StatusMap,
    validator: ParamValidator,
    logger: ResultLogger,
    plan_id: i64,
}

impl ResultUploader {
    /// Connect to TestRail and prepare the target plan.
    pub async fn initialize(config: &SyncConfig) -> Result<Self, UploaderError> {
        let client = TestRailClient::from_settings(&config.testrail, &config.transport)?;
        Self::initialize_with_client(client, config.project.clone()).await
    }

    /// Prepare the target plan using an existing client.
    ///
    /// Resolves the configured status names, validates the project settings
    /// and finds or creates the plan, whose id is kept for every later batch.
    pub async fn initialize_with_client(
        client: TestRailClient,
        project: ProjectSettings,
    ) -> Result<Self, UploaderError> {
        let statuses = client.get_custom_statuses().await?;
        let status_map = StatusMap::from_account_names(&project.status_names, &statuses)?;

        let validator = ParamValidator::new(client.clone());
        validator
            .validate_params(
                Some(project.project_id),
                Some(project.suite_id),
                Some(project.plan_name.as_str()),
                Some(project.run_name.as_str()),
            )
            .await?;
        for warning in status_map::verify(&status_map, &statuses) {
            warn!("{}", warning);
        }

        let logger = ResultLogger::new(client);
        let plan = logger
            .verify_or_create_plan(project.project_id, None, &project.plan_name)
            .await?;
        info!(
            "Uploader ready: project={} suite={} plan={} ('{}') run='{}'",
            project.project_id, project.suite_id, plan.id, plan.name, project.run_name
        );

        Ok(Self {
            project,
            status_map,
            validator,
            logger,
            plan_id: plan.id,
        })
    }

    pub fn plan_id(&self) -> i64 {
        self.plan_id
    }

    pub fn status_map(&self) -> &StatusMap {
        &self.status_map
    }

    /// Upload one batch into the configured run; returns case ids dropped as invalid.
    pub async fn upload_results(
        &self,
        results: &[UploadResult],
    ) -> Result<BTreeSet<i64>, UploaderError> {
        self.validator
            .validate_case_ids(
                self.project.project_id,
                self.project.suite_id,
                results.iter().map(|r| r.test_case_id.as_str()),
            )
            .await?;

        let mut table = ResultTable::new();
        for result in results {
            if is_blank(&result.test_case_id) {
                continue;
            }
            let Some(case_id) = extract_case_id(&result.test_case_id) else {
                continue;
            };
            let status_id = self.status_map.get_status(result.status)?;
            table.insert(
                self.project.run_name.as_str(),
                case_id,
                StatusComment::new(status_id, result.comment.as_str()),
            );
        }

        if table.is_empty() {
            info!("No results with case ids to upload");
            return Ok(BTreeSet::new());
        }

        let request = ReconcileRequest {
            project_id: self.project.project_id,
            suite_id: self.project.suite_id,
            plan_name: self.project.plan_name.clone(),
            plan_id: Some(self.plan_id),
            include_all: self.project.add_all_tests_to_plan,
        };
        Ok(self.logger.execute(&mut table, &request).await?)
    }
}
