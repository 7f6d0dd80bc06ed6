//! Integration tests for the gated Claude relay route.
//!
//! Only paths that end before Anthropic is called are covered here.

#![allow(clippy::unwrap_used)]

use axum::http::{StatusCode, header};
use serde_json::json;
use storefront_gateway_integration_tests::{
    ALLOWED_ORIGIN, FOREIGN_ORIGIN, app_with_claude, json_body, request, unconfigured_app,
};
use tower::ServiceExt;

const CLAUDE: &str = "/api/claude";
const CHAT: &str = r#"{"messages":[{"role":"user","content":"Where is my order?"}]}"#;

#[tokio::test]
async fn test_missing_api_key_is_server_error() {
    let response = unconfigured_app()
        .oneshot(request("POST", CLAUDE, Some(ALLOWED_ORIGIN), Some(CHAT)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        ALLOWED_ORIGIN
    );
    assert_eq!(
        json_body(response).await,
        json!({"error": "Missing ANTHROPIC_API_KEY"})
    );
}

#[tokio::test]
async fn test_empty_messages_are_bad_request() {
    for body in [r#"{"messages":[]}"#, r#"{"prompt":"hi"}"#, "[]"] {
        let response = app_with_claude()
            .oneshot(request("POST", CLAUDE, Some(ALLOWED_ORIGIN), Some(body)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(
            json_body(response).await,
            json!({"error": "messages array is required"})
        );
    }
}

#[tokio::test]
async fn test_foreign_origin_never_reaches_relay() {
    let response = app_with_claude()
        .oneshot(request("POST", CLAUDE, Some(FOREIGN_ORIGIN), Some(CHAT)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_preflight() {
    let response = app_with_claude()
        .oneshot(request("OPTIONS", CLAUDE, Some(ALLOWED_ORIGIN), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        ALLOWED_ORIGIN
    );
}
