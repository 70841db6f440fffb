//! Typed TestRail operations.
//!
//! Each operation issues one logical call through a [`Transport`] and maps the
//! outcome onto [`TestRailError`]. A 400 or 403 may carry an endpoint-specific
//! meaning (unknown id, missing permission); every other unsuccessful status
//! gets the same treatment on every endpoint. List endpoints are drained page
//! by page.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{ConfigError, TestRailSettings, TransportSettings};
use crate::error::{TestRailError, TestRailResult};
use crate::gateway::transport::{ApiRequest, ApiResponse, HttpTransport, Transport, TransportError};
use crate::models::{
    NewPlan, NewPlanEntry, NewResult, Page, Plan, PlanEntry, PlanEntryUpdate, Project,
    ResultRecord, ResultsForCases, StatusComment, Status, Suite, Test, TestCase,
};

/// Items requested per page from list endpoints.
pub const PAGE_LIMIT: u32 = 250;

/// How a single endpoint reports failures.
struct EndpointErrors {
    /// Meaning of a 400 on this endpoint
    bad_request: Option<String>,
    /// Meaning of a 403 on this endpoint
    access_denied: Option<String>,
    /// Detail used by the generic status mapping
    failure: String,
}

impl EndpointErrors {
    fn new(failure: String) -> Self {
        EndpointErrors {
            bad_request: None,
            access_denied: None,
            failure,
        }
    }

    fn bad_request(mut self, message: String) -> Self {
        self.bad_request = Some(message);
        self
    }

    fn access_denied(mut self, message: String) -> Self {
        self.access_denied = Some(message);
        self
    }

    fn map_response(&self, path: &str, response: &ApiResponse) -> TestRailError {
        match (response.status, &self.bad_request, &self.access_denied) {
            (400, Some(message), _) => TestRailError::BadRequest(with_remote_body(
                message,
                &response.body,
            )),
            (403, _, Some(message)) => TestRailError::AccessDenied(with_remote_body(
                message,
                &response.body,
            )),
            (status, _, _) => map_status(status, path, &response.body, &self.failure),
        }
    }

    fn map_transport(&self, error: TransportError) -> TestRailError {
        match error {
            TransportError::Timeout(msg) => {
                TestRailError::SocketTimeout(format!("{}: {}", self.failure, msg))
            }
            TransportError::Other(msg) => {
                TestRailError::UnknownError(format!("{}: {}", self.failure, msg))
            }
        }
    }
}

fn with_remote_body(message: &str, body: &str) -> String {
    if body.trim().is_empty() {
        message.to_string()
    } else {
        format!("{} Error from testrail: {}", message, body)
    }
}

/// Map an unsuccessful HTTP status to an error, independent of the endpoint.
pub fn map_status(status: u16, path: &str, body: &str, detail: &str) -> TestRailError {
    let body = if body.trim().is_empty() {
        "[unavailable]"
    } else {
        body
    };
    match status {
        409 => TestRailError::Maintenance(format!("{} Error from testrail: {}", detail, body)),
        401 => TestRailError::AuthenticationFailed(format!(
            "{} Error from testrail: {}",
            detail, body
        )),
        429 => TestRailError::HitRateLimit(format!("{} Error from testrail: {}", detail, body)),
        404 => TestRailError::InvalidRoute(format!(
            "Invalid Route: {} Error from testrail: {}",
            path, body
        )),
        _ => TestRailError::UnknownError(format!(
            "{} (HTTP {}) Error from testrail: {}",
            detail, status, body
        )),
    }
}

/// Typed client over a [`Transport`].
#[derive(Clone)]
pub struct TestRailClient {
    transport: Arc<dyn Transport>,
}

impl TestRailClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Create a client speaking HTTP to the configured TestRail instance.
    pub fn from_settings(
        testrail: &TestRailSettings,
        transport: &TransportSettings,
    ) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(testrail, transport)?;
        Ok(Self::new(Arc::new(transport)))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        errors: &EndpointErrors,
    ) -> TestRailResult<T> {
        let path = request.path.clone();
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| errors.map_transport(e))?;
        debug!("Received HTTP {} for {}", response.status, path);

        if !response.is_success() {
            return Err(errors.map_response(&path, &response));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            TestRailError::UnknownError(format!(
                "{}: unreadable response from {}: {}",
                errors.failure, path, e
            ))
        })
    }

    /// Fetch every page of a list endpoint, in page order.
    async fn paginate<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        errors: &EndpointErrors,
    ) -> TestRailResult<Vec<T>> {
        let mut items = Vec::new();
        let mut offset: u32 = 0;

        loop {
            let page_request = request
                .clone()
                .query("limit", PAGE_LIMIT)
                .query("offset", offset);
            let page: Page<T> = self.call(page_request, errors).await?;
            let has_next = page.has_next();
            items.extend(page.items);

            if !has_next {
                break;
            }
            offset += PAGE_LIMIT;
        }

        Ok(items)
    }

    /// Fetch a plan with its entries and runs.
    pub async fn get_test_plan(&self, plan_id: i64) -> TestRailResult<Plan> {
        debug!("Getting test plan {}", plan_id);
        let errors = EndpointErrors::new(format!("Could not get TestRail test plan: {}", plan_id))
            .bad_request(format!("Invalid or unknown test plan: {}", plan_id))
            .access_denied(format!(
                "No access to TestRail project for planId: {}",
                plan_id
            ));
        self.call(ApiRequest::get(format!("/get_plan/{}", plan_id)), &errors)
            .await
    }

    /// Result statuses configured on the account.
    pub async fn get_custom_statuses(&self) -> TestRailResult<Vec<Status>> {
        debug!("Getting TestRail statuses");
        let errors = EndpointErrors::new("Could not get TestRail statuses".to_string());
        self.call(ApiRequest::get("/get_statuses"), &errors).await
    }

    pub async fn get_project(&self, project_id: i64) -> TestRailResult<Project> {
        debug!("Getting project {}", project_id);
        let errors =
            EndpointErrors::new(format!("Could not get TestRail project: {}", project_id))
                .bad_request(format!("Invalid or unknown project: {}", project_id))
                .access_denied(format!("No access to TestRail project: {}", project_id));
        self.call(ApiRequest::get(format!("/get_project/{}", project_id)), &errors)
            .await
    }

    pub async fn get_test_suite(&self, suite_id: i64) -> TestRailResult<Suite> {
        debug!("Getting test suite {}", suite_id);
        let errors =
            EndpointErrors::new(format!("Could not get TestRail test suite: {}", suite_id))
                .bad_request(format!("Invalid or unknown test suite: {}", suite_id))
                .access_denied(format!(
                    "No access to TestRail project for suiteId: {}",
                    suite_id
                ));
        self.call(ApiRequest::get(format!("/get_suite/{}", suite_id)), &errors)
            .await
    }

    /// Create an empty plan in a project.
    pub async fn create_test_plan(&self, project_id: i64, name: &str) -> TestRailResult<Plan> {
        debug!("Creating test plan '{}' in project {}", name, project_id);
        let errors = EndpointErrors::new(format!(
            "Could not add TestRail plan for project id: {}",
            project_id
        ))
        .bad_request(format!("Invalid or unknown project: {}", project_id))
        .access_denied(
            "No permission to add test plans or no access to TestRail project.".to_string(),
        );
        let body = to_body(&NewPlan::new(name))?;
        self.call(
            ApiRequest::post(format!("/add_plan/{}", project_id), body),
            &errors,
        )
        .await
    }

    /// Record one result against a test.
    pub async fn add_result(&self, test_id: i64, result: &NewResult) -> TestRailResult<ResultRecord> {
        debug!("Adding result for test {}", test_id);
        let errors =
            EndpointErrors::new(format!("Could not add TestRail result for test id: {}", test_id))
                .bad_request(format!("Invalid or unknown test id: {}", test_id))
                .access_denied(
                    "No permission to add test result or no access to TestRail project."
                        .to_string(),
                );
        let body = to_body(result)?;
        self.call(
            ApiRequest::post(format!("/add_result/{}", test_id), body),
            &errors,
        )
        .await
    }

    /// Record a batch of results for cases of a run.
    pub async fn add_results(
        &self,
        run_id: i64,
        results: &BTreeMap<i64, StatusComment>,
    ) -> TestRailResult<Vec<ResultRecord>> {
        debug!("Adding {} results to run {}", results.len(), run_id);
        let errors =
            EndpointErrors::new(format!("Could not add TestRail result for run id: {}", run_id))
                .bad_request(format!("Invalid or unknown run id: {}", run_id))
                .access_denied(
                    "No permission to add test result or no access to TestRail project."
                        .to_string(),
                );
        let body = to_body(&ResultsForCases::from_row(results))?;
        self.call(
            ApiRequest::post(format!("/add_results_for_cases/{}", run_id), body),
            &errors,
        )
        .await
    }

    /// All cases of a suite.
    pub async fn get_test_cases_for_suite(
        &self,
        project_id: i64,
        suite_id: i64,
    ) -> TestRailResult<Vec<TestCase>> {
        debug!("Getting cases for project {} suite {}", project_id, suite_id);
        let errors = EndpointErrors::new(format!(
            "Could not fetch test case for suite: {}",
            suite_id
        ))
        .bad_request(format!(
            "Invalid or unknown project [{}] or suite [{}]",
            project_id, suite_id
        ))
        .access_denied(
            "No permission to get this suite or no access to TestRail project".to_string(),
        );
        let request = ApiRequest::get(format!("/get_cases/{}", project_id)).query("suite_id", suite_id);
        self.paginate(request, &errors).await
    }

    /// Ids of all cases of a suite.
    pub async fn get_case_ids(&self, project_id: i64, suite_id: i64) -> TestRailResult<BTreeSet<i64>> {
        Ok(self
            .get_test_cases_for_suite(project_id, suite_id)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect())
    }

    /// Add an entry, and with it a run, to a plan.
    pub async fn create_new_plan_entry(
        &self,
        run_name: &str,
        suite_id: i64,
        plan_id: i64,
        include_all: bool,
        case_ids: &BTreeSet<i64>,
    ) -> TestRailResult<PlanEntry> {
        if case_ids.is_empty() {
            return Err(TestRailError::BadRequest(
                "TestcaseId invalid. PlanEntry creation must contain at least 1 valid Testcase Id."
                    .to_string(),
            ));
        }

        debug!(
            "Creating plan entry '{}' for suite {} in plan {} with {} cases",
            run_name,
            suite_id,
            plan_id,
            case_ids.len()
        );
        let errors = EndpointErrors::new(format!(
            "Could not add TestRail plan entry for test plan id: {}",
            plan_id
        ))
        .bad_request(format!("Invalid or unknown test plan id: {}", plan_id))
        .access_denied(
            "No permission to modify test plans or no access to TestRail project.".to_string(),
        );
        let body = to_body(&NewPlanEntry {
            suite_id,
            name: run_name.to_string(),
            include_all,
            case_ids: case_ids.iter().copied().collect(),
        })?;
        self.call(
            ApiRequest::post(format!("/add_plan_entry/{}", plan_id), body),
            &errors,
        )
        .await
    }

    /// Apply a partial update to a plan entry.
    pub async fn update_existing_plan_entry(
        &self,
        plan_id: i64,
        entry_id: &str,
        update: &PlanEntryUpdate,
    ) -> TestRailResult<PlanEntry> {
        debug!("Updating plan entry {} in plan {}", entry_id, plan_id);
        let errors = EndpointErrors::new(format!(
            "Could not update TestRail plan entry {} in plan {}",
            entry_id, plan_id
        ))
        .bad_request(format!(
            "Bad request for test plan: {} of test plan entry: {}",
            plan_id, entry_id
        ))
        .access_denied(
            "No permission to modify test plans or no access to TestRail project.".to_string(),
        );
        let body = to_body(update)?;
        self.call(
            ApiRequest::post(format!("/update_plan_entry/{}/{}", plan_id, entry_id), body),
            &errors,
        )
        .await
    }

    /// All plans of a project (without entries).
    pub async fn get_test_plans(&self, project_id: i64) -> TestRailResult<Vec<Plan>> {
        debug!("Getting test plans for project {}", project_id);
        let errors = EndpointErrors::new(format!(
            "Could not get TestRail test project: {}",
            project_id
        ))
        .bad_request(format!("Invalid or unknown project: {}", project_id))
        .access_denied(format!("No access to TestRail project: {}", project_id));
        self.paginate(ApiRequest::get(format!("/get_plans/{}", project_id)), &errors)
            .await
    }

    /// The most recently created open plan with exactly this name.
    pub async fn find_existing_test_plan(
        &self,
        project_id: i64,
        plan_name: &str,
    ) -> TestRailResult<Option<Plan>> {
        let plans = self.get_test_plans(project_id).await?;
        Ok(plans
            .into_iter()
            .filter(|p| !p.is_completed && p.name == plan_name)
            .max_by_key(|p| p.created_on))
    }

    /// Tests of a run, optionally filtered by a comma-separated status id list.
    pub async fn get_test_results_for_run(
        &self,
        run_id: i64,
        status_filter: Option<&str>,
    ) -> TestRailResult<Vec<Test>> {
        debug!("Getting tests for run {}", run_id);
        let errors = EndpointErrors::new(format!(
            "Could not get TestRail test list for test run id: {}",
            run_id
        ))
        .bad_request(format!("Invalid or unknown test run id: {}", run_id))
        .access_denied(format!(
            "No access to TestRail project for testRailRunId: {}",
            run_id
        ));
        let mut request = ApiRequest::get(format!("/get_tests/{}", run_id));
        if let Some(status_ids) = status_filter {
            request = request.query("status_id", status_ids);
        }
        self.paginate(request, &errors).await
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> TestRailResult<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| TestRailError::UnknownError(format!("Could not encode request: {}", e)))
}
