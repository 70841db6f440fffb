//! E2E tests: HTTP transport, error mapping and pagination.

use secrecy::SecretString;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use testrail_sync::config::{TestRailSettings, TransportSettings};
use testrail_sync::error::ErrorKind;
use testrail_sync::gateway::{ApiRequest, HttpTransport, TestRailClient, Transport};
use testrail_sync::models::{NewResult, StatusComment};

use super::test_helpers::*;

#[actix_rt::test]
async fn test_requests_are_rewritten_and_authenticated() {
    let mock = start_mock().await;
    let client = client(&mock);

    let project = client.get_project(PROJECT_ID).await.unwrap();
    assert_eq!(project.name, "Mobile");
    assert!(!project.is_completed);

    let calls = mock.calls_to("get_project");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "GET");
    assert_eq!(calls[0].route, "/api/v2/get_project/5");
    assert!(calls[0]
        .authorization
        .as_deref()
        .is_some_and(|a| a.starts_with("Basic ")));
}

#[actix_rt::test]
async fn test_statuses() {
    let mock = start_mock().await;

    let statuses = client(&mock).get_custom_statuses().await.unwrap();
    assert_eq!(statuses.len(), 5);
    assert!(statuses.iter().any(|s| s.id == 3 && s.is_untested));
}

#[actix_rt::test]
async fn test_unknown_route_is_invalid_route() {
    let mock = start_mock().await;
    let transport =
        HttpTransport::new(&testrail_settings(&mock), &transport_settings()).unwrap();

    let response = transport
        .execute(ApiRequest::get("/get_nonsense/1"))
        .await
        .unwrap();
    assert_eq!(response.status, 404);

    mock.fail("get_plan", 404, r#"{"error": "Unknown method"}"#);
    let err = client(&mock).get_test_plan(12).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRoute);
    assert!(err.to_string().contains("Invalid Route: /get_plan/12"));
}

#[actix_rt::test]
async fn test_status_codes_map_to_error_kinds() {
    let mock = start_mock().await;
    let client = client(&mock);

    for (status, kind) in [
        (409, ErrorKind::Maintenance),
        (401, ErrorKind::AuthenticationFailed),
        (429, ErrorKind::HitRateLimit),
        (500, ErrorKind::UnknownError),
    ] {
        mock.fail("get_plans", status, r#"{"error": "injected"}"#);
        let err = client.get_test_plans(PROJECT_ID).await.unwrap_err();
        assert_eq!(err.kind(), kind, "HTTP {}", status);
        assert!(err.to_string().contains("injected"));
    }
}

#[actix_rt::test]
async fn test_endpoint_message_then_generic_mapping() {
    let mock = start_mock().await;
    let transport =
        HttpTransport::new(&testrail_settings(&mock), &transport_settings()).unwrap();
    mock.with_state(|s| s.projects.clear());

    let client = TestRailClient::new(std::sync::Arc::new(transport));
    let err = client.get_project(PROJECT_ID).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(err.details().contains("Invalid or unknown project: 5"));

    mock.fail("get_project", 401, "");
    let err = client.get_project(PROJECT_ID).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    assert!(err.details().contains("[unavailable]"));
}

#[actix_rt::test]
async fn test_slow_server_times_out() {
    let mock = start_mock().await;
    mock.set_delay(Some(Duration::from_secs(3)));
    let transport = TransportSettings {
        connect_timeout: Duration::from_secs(1),
        request_timeout: Duration::from_millis(300),
        proxy: None,
    };
    let client = TestRailClient::from_settings(&testrail_settings(&mock), &transport).unwrap();

    let err = client.get_project(PROJECT_ID).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SocketTimeout);
    assert!(err.is_retryable());
}

#[actix_rt::test]
async fn test_unreachable_server_is_unknown_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    drop(listener);

    let settings = TestRailSettings {
        url,
        email: "qa@example.com".to_string(),
        api_key: SecretString::from("key"),
    };
    let client = TestRailClient::from_settings(&settings, &transport_settings()).unwrap();

    let err = client.get_custom_statuses().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownError);
}

#[actix_rt::test]
async fn test_cases_are_fetched_across_pages() {
    let mut state = default_state();
    state.add_cases(SUITE_ID, 11..=300);
    let mock = start_mock_with(state).await;

    let ids = client(&mock).get_case_ids(PROJECT_ID, SUITE_ID).await.unwrap();
    assert_eq!(ids.len(), 300);
    assert_eq!(ids.first(), Some(&1));
    assert_eq!(ids.last(), Some(&300));

    let calls = mock.calls_to("get_cases");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].query_value("offset"), Some("0"));
    assert_eq!(calls[1].query_value("offset"), Some("250"));
    assert!(calls.iter().all(|c| c.query_value("suite_id") == Some("7")));
}

#[actix_rt::test]
async fn test_find_existing_plan_prefers_latest_open_across_pages() {
    let mut state = default_state();
    state.add_plan(PROJECT_ID, "Nightly", true);
    for i in 0..260 {
        state.add_plan(PROJECT_ID, &format!("Filler {}", i), false);
    }
    let wanted = state.add_plan(PROJECT_ID, "Nightly", false);
    let mock = start_mock_with(state).await;

    let plan = client(&mock)
        .find_existing_test_plan(PROJECT_ID, "Nightly")
        .await
        .unwrap()
        .expect("plan not found");
    assert_eq!(plan.id, wanted);
    assert_eq!(mock.calls_to("get_plans").len(), 2);
}

#[actix_rt::test]
async fn test_plan_entry_errors() {
    let mock = start_mock().await;
    let client = client(&mock);
    let cases = BTreeSet::from([1, 2]);

    let err = client
        .create_new_plan_entry("smoke", SUITE_ID, 100, true, &cases)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(err.to_string().contains("100"));

    mock.fail("add_plan_entry", 403, r#"{"error": "No permission"}"#);
    let err = client
        .create_new_plan_entry("smoke", SUITE_ID, 100, true, &cases)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccessDenied);
    assert!(!err.is_retryable());
}

#[actix_rt::test]
async fn test_single_and_batched_results() {
    let mut state = default_state();
    let plan_id = state.add_plan(PROJECT_ID, "Nightly", false);
    let run_id = state.add_run(plan_id, SUITE_ID, "smoke", [1, 2], false);
    let mock = start_mock_with(state).await;
    let client = client(&mock);

    let tests = client.get_test_results_for_run(run_id, None).await.unwrap();
    assert_eq!(tests.len(), 2);

    let record = client
        .add_result(tests[0].id, &NewResult::from(StatusComment::new(1, "ok")))
        .await
        .unwrap();
    assert_eq!(record.test_id, tests[0].id);

    let row = BTreeMap::from([(2, StatusComment::new(5, "boom"))]);
    client.add_results(run_id, &row).await.unwrap();

    let results = mock.with_state(|s| {
        s.results_for_run(run_id)
            .into_iter()
            .map(|r| (r.case_id, r.status_id))
            .collect::<Vec<_>>()
    });
    assert_eq!(results, vec![(1, 1), (2, 5)]);

    client
        .get_test_results_for_run(run_id, Some("1,5"))
        .await
        .unwrap();
    let last = mock.calls_to("get_tests").pop().unwrap();
    assert_eq!(last.query_value("status_id"), Some("1,5"));
}

#[actix_rt::test]
async fn test_run_tests_are_fetched_across_pages() {
    let mut state = default_state();
    state.add_cases(SUITE_ID, 11..=300);
    let plan_id = state.add_plan(PROJECT_ID, "Nightly", false);
    let run_id = state.add_run(plan_id, SUITE_ID, "smoke", 1..=300, false);
    let mock = start_mock_with(state).await;

    let tests = client(&mock)
        .get_test_results_for_run(run_id, None)
        .await
        .unwrap();
    let case_ids: BTreeSet<i64> = tests.iter().map(|t| t.case_id).collect();
    assert_eq!(case_ids, (1..=300).collect::<BTreeSet<_>>());
    assert!(tests.iter().all(|t| t.run_id == Some(run_id)));

    let calls = mock.calls_to("get_tests");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].query_value("offset"), Some("0"));
    assert_eq!(calls[1].query_value("offset"), Some("250"));
}
