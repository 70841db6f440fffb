//! E2E tests: project, suite, case id and status configuration checks.

use testrail_sync::error::ErrorKind;
use testrail_sync::services::status_map::UNTESTED;
use testrail_sync::services::{ParamValidator, StatusMap, StatusOverrides};

use super::test_helpers::*;

fn validator(mock: &super::mock_testrail::MockTestRail) -> ParamValidator {
    ParamValidator::new(client(mock))
}

#[actix_rt::test]
async fn test_open_project_and_suite_pass() {
    let mock = start_mock().await;
    let validator = validator(&mock);

    let project = validator.validate_project(PROJECT_ID).await.unwrap();
    assert_eq!(project.id, PROJECT_ID);
    let suite = validator.validate_suite(SUITE_ID, PROJECT_ID).await.unwrap();
    assert_eq!(suite.project_id, PROJECT_ID);

    validator
        .validate_params(Some(PROJECT_ID), Some(SUITE_ID), Some("Nightly"), Some("smoke"))
        .await
        .unwrap();
}

#[actix_rt::test]
async fn test_unknown_project_is_bad_request() {
    let mock = start_mock().await;

    let err = validator(&mock).validate_project(404).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(err.details().contains("404"));
}

#[actix_rt::test]
async fn test_completed_project_is_access_denied() {
    let mock = start_mock().await;

    let err = validator(&mock)
        .validate_project(COMPLETED_PROJECT_ID)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccessDenied);
    assert!(!err.is_retryable());
}

#[actix_rt::test]
async fn test_completed_or_foreign_suite_is_access_denied() {
    let mock = start_mock().await;
    let validator = validator(&mock);

    let err = validator
        .validate_suite(COMPLETED_SUITE_ID, PROJECT_ID)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccessDenied);
    assert!(err.details().contains("completed"));

    let err = validator
        .validate_suite(FOREIGN_SUITE_ID, PROJECT_ID)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccessDenied);
    assert!(err.details().contains(&PROJECT_ID.to_string()));

    let err = validator
        .validate_params(Some(PROJECT_ID), Some(FOREIGN_SUITE_ID), Some("Nightly"), Some("smoke"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccessDenied);
}

#[actix_rt::test]
async fn test_basic_violations_skip_remote_checks() {
    let mock = start_mock().await;

    let err = validator(&mock)
        .validate_params(Some(PROJECT_ID), Some(-7), Some(""), Some("smoke"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(err.details().contains("Invalid plan name"));
    assert!(err.details().contains("Invalid suite id: -7"));
    assert!(mock.calls_to("get_project").is_empty());
}

#[actix_rt::test]
async fn test_case_ids_checked_against_every_page() {
    let mut state = default_state();
    state.add_cases(SUITE_ID, 11..=300);
    let mock = start_mock_with(state).await;
    let validator = validator(&mock);

    validator
        .validate_case_ids(PROJECT_ID, SUITE_ID, ["C1", "299", "", "C300"])
        .await
        .unwrap();
    assert_eq!(mock.calls_to("get_cases").len(), 2);

    let err = validator
        .validate_case_ids(PROJECT_ID, SUITE_ID, ["C1", "C301", "abc"])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CaseId);
    assert!(err.details().contains("C301"));
    assert!(err.details().contains("no matching case"));

    let err = validator
        .validate_case_ids(PROJECT_ID, SUITE_ID, ["C1", "12.5", "C301"])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CaseId);
    assert!(err.details().contains("12.5 is invalid"));
}

#[actix_rt::test]
async fn test_configuration_returns_status_warnings() {
    let mock = start_mock().await;
    let validator = validator(&mock);

    let warnings = validator
        .validate_configuration(
            Some(PROJECT_ID),
            Some(SUITE_ID),
            Some("Nightly"),
            Some("smoke"),
            Some(&StatusMap::default()),
        )
        .await
        .unwrap();
    assert!(warnings.is_empty());

    let map = StatusMap::build(&StatusOverrides {
        skipped: Some(UNTESTED),
        error: Some(42),
        ..Default::default()
    });
    let warnings = validator
        .validate_configuration(Some(PROJECT_ID), Some(SUITE_ID), Some("Nightly"), Some("smoke"), Some(&map))
        .await
        .unwrap();
    assert_eq!(warnings.len(), 2);

    let warnings = validator
        .validate_configuration(Some(PROJECT_ID), Some(SUITE_ID), Some("Nightly"), Some("smoke"), None)
        .await
        .unwrap();
    assert!(warnings.is_empty());
}
