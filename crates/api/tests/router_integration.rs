//! Router tests that need no database.
//!
//! Tests cover:
//! - Liveness, health reporting when the database is down, request ids
//! - Telegram status and test sends through the configured sender
//! - Request validation that rejects before any query runs

mod common;

use axum::http::{Method, StatusCode};
use common::{get_request, json_request, offline_app, parse_response_body, raw_json_request};
use serde_json::json;
use tower::ServiceExt;

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_live_probe() {
    let (app, _) = offline_app();

    let response = app.oneshot(get_request("/api/health/live")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let (app, _) = offline_app();

    let response = app.oneshot(get_request("/api/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["database"]["connected"], false);
    assert_eq!(body["telegram"]["botTokenConfigured"], true);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (app, _) = offline_app();

    let mut request = get_request("/api/health/live");
    request
        .headers_mut()
        .insert("x-request-id", "req-abc".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-abc");
}

// =============================================================================
// Telegram
// =============================================================================

#[tokio::test]
async fn test_telegram_status() {
    let (app, _) = offline_app();

    let response = app.oneshot(get_request("/api/telegram/status")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body, json!({"botTokenConfigured": true}));
}

#[tokio::test]
async fn test_telegram_test_sends_escaped_message() {
    let (app, sender) = offline_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/telegram/test",
            json!({"chatId": " 12345 ", "message": "Oil & filters <ok>"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body, json!({"success": true}));
    assert_eq!(
        sender.sent(),
        vec![(
            "12345".to_string(),
            "Oil &amp; filters &lt;ok&gt;".to_string()
        )]
    );
}

#[tokio::test]
async fn test_telegram_test_requires_chat_id() {
    let (app, sender) = offline_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/telegram/test",
            json!({"chatId": "", "message": "hello"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn test_system_message_requires_text() {
    let (app, _) = offline_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/notifications/send-system-message",
            json!({"message": ""}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
}

// =============================================================================
// Validation before storage
// =============================================================================

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, _) = offline_app();

    let response = app
        .oneshot(raw_json_request(Method::POST, "/api/tasks", "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_unknown_task_status_is_bad_request() {
    let (app, _) = offline_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/tasks",
            json!({"status": "Somewhere"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_task_list_rejects_inverted_range() {
    let (app, _) = offline_app();

    let response = app
        .oneshot(get_request("/api/tasks?from=2024-05-01&to=2024-04-01"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analytics_rejects_month_out_of_range() {
    let (app, _) = offline_app();

    let response = app
        .oneshot(get_request(
            "/api/analytics/full?startYear=2024&startMonth=13&endYear=2024&endMonth=12",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expense_delete_forbidden_for_engineers() {
    let (app, _) = offline_app();

    let response = app
        .oneshot(json_request(
            Method::DELETE,
            "/api/analytics",
            json!({"region": "Київський", "year": 2024, "month": 3, "role": "engineer"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_access_rules_must_be_object() {
    let (app, _) = offline_app();

    let response = app
        .oneshot(json_request(Method::POST, "/api/accessRules", json!([1, 2])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
