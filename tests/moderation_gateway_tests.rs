//! Moderation gateway over HTTP

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;
use premiads_server::moderation::ModerationAction;

const ENDPOINT: &str = "/functions/v1/moderate-submission";

fn body(submission_id: &str, action: &str) -> String {
    json!({ "submission_id": submission_id, "action": action }).to_string()
}

#[tokio::test]
async fn advertiser_rejection_goes_to_second_instance() {
    let app = TestApp::new();
    app.user("adv-token", "adv-1", "anunciante");
    app.baas.respond_with(
        "reject_submission_to_second_instance",
        json!({ "id": "sub-42", "status": "second_instance_pending" }),
    );

    let (status, response) = app
        .post(
            ENDPOINT,
            Some("adv-token"),
            &body("sub-42", "ADVERTISER_REJECT_TO_SECOND_INSTANCE"),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], true);
    assert_eq!(response["rpc_name"], "reject_submission_to_second_instance");
    assert_eq!(response["data"]["status"], "second_instance_pending");

    let calls = app.baas.rpc_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].params,
        json!({ "p_submission_id": "sub-42", "p_advertiser_id": "adv-1" })
    );
}

#[tokio::test]
async fn unpermitted_roles_are_refused_for_every_action() {
    for action in ModerationAction::ALL {
        for role in ["participante", "moderador"] {
            let app = TestApp::new();
            app.user("token", "caller-1", role);

            let (status, response) = app
                .post(ENDPOINT, Some("token"), &body("sub-1", action.as_str()))
                .await;

            assert_eq!(status, StatusCode::FORBIDDEN, "{} as {}", action, role);
            assert!(response["error"].as_str().unwrap().contains(role));
            assert!(app.baas.rpc_calls().is_empty());
        }
    }
}

#[tokio::test]
async fn admin_reject_refuses_advertisers() {
    let app = TestApp::new();
    app.user("adv-token", "adv-1", "anunciante");

    let (status, response) = app
        .post(ENDPOINT, Some("adv-token"), &body("sub-1", "ADMIN_REJECT"))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    let error = response["error"].as_str().unwrap();
    assert!(error.contains("admin"));
    assert!(error.contains("anunciante"));
    assert!(app.baas.rpc_calls().is_empty());
}

#[tokio::test]
async fn admin_actions_use_admin_parameter() {
    let app = TestApp::new();
    app.user("admin-token", "admin-1", "admin");

    let (status, _) = app
        .post(
            ENDPOINT,
            Some("admin-token"),
            &body("sub-7", "ADMIN_RETURN_TO_ADVERTISER"),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let calls = app.baas.rpc_calls();
    assert_eq!(calls[0].name, "admin_return_submission_to_advertiser");
    assert_eq!(
        calls[0].params,
        json!({ "p_submission_id": "sub-7", "p_admin_id": "admin-1" })
    );
}

#[tokio::test]
async fn missing_bearer_is_unauthorized() {
    let app = TestApp::new();

    let (status, _) = app
        .post(ENDPOINT, None, &body("sub-1", "ADMIN_REJECT"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(ENDPOINT, Some("unknown-token"), &body("sub-1", "ADMIN_REJECT"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let app = TestApp::new();
    app.user("admin-token", "admin-1", "admin");

    for payload in [
        "{not json".to_string(),
        json!({ "action": "ADMIN_REJECT" }).to_string(),
        json!({ "submission_id": "sub-1" }).to_string(),
        body("sub-1", "ADMIN_APPROVE_EVERYTHING"),
    ] {
        let (status, response) = app.post(ENDPOINT, Some("admin-token"), &payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", payload);
        assert!(response["error"].is_string());
    }
    assert!(app.baas.rpc_calls().is_empty());
}

#[tokio::test]
async fn caller_without_profile_is_forbidden() {
    let app = TestApp::new();
    app.baas.register_user("orphan-token", "orphan");

    let (status, response) = app
        .post(
            ENDPOINT,
            Some("orphan-token"),
            &body("sub-1", "ADVERTISER_APPROVE_FIRST_INSTANCE"),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(response["error"], "Profile not found");
}

#[tokio::test]
async fn procedure_failure_reports_diagnostics() {
    let app = TestApp::new();
    app.user("adv-token", "adv-1", "anunciante");
    app.baas
        .fail_rpc("approve_submission_first_instance", "submission is not pending");

    let (status, response) = app
        .post(
            ENDPOINT,
            Some("adv-token"),
            &body("sub-3", "ADVERTISER_APPROVE_FIRST_INSTANCE"),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["rpc_name"], "approve_submission_first_instance");
    assert_eq!(response["rpc_params"]["p_submission_id"], "sub-3");
    assert!(response["details"]
        .as_str()
        .unwrap()
        .contains("submission is not pending"));
}
