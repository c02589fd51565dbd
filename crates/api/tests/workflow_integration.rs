//! Database-backed workflow tests.
//!
//! Each test returns early unless `TEST_DATABASE_URL` points at a scratch
//! PostgreSQL database. Tests truncate every table, so run them with
//! `--test-threads=1`.

mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::{
    cleanup_all_test_data, database_app, database_pool, get_request, json_request,
    parse_response_body, settle, test_login,
};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn upsert_user(app: &axum::Router, body: Value) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/users", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    parse_response_body(response).await
}

async fn create_task(app: &axum::Router, body: Value) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/tasks", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    parse_response_body(response).await
}

// =============================================================================
// Tasks and notifications
// =============================================================================

#[tokio::test]
async fn test_create_task_notifies_region_subscribers() {
    let Some(pool) = database_pool().await else {
        return;
    };
    let (app, sender) = database_app(pool.clone());

    let author = test_login("author");
    upsert_user(
        &app,
        json!({"login": author, "role": "service", "region": "Київський",
               "telegramChatId": "100", "notificationSettings": {"newRequests": true}}),
    )
    .await;
    upsert_user(
        &app,
        json!({"login": test_login("kyiv"), "role": "operator", "region": "Київський",
               "telegramChatId": "200", "notificationSettings": {"newRequests": true}}),
    )
    .await;
    upsert_user(
        &app,
        json!({"login": test_login("odesa"), "role": "operator", "region": "Одеський",
               "telegramChatId": "300", "notificationSettings": {"newRequests": true}}),
    )
    .await;

    let task = create_task(
        &app,
        json!({"requestNumber": "KV-0001", "serviceRegion": "Київський",
               "client": "ТОВ Ромашка", "authorLogin": author}),
    )
    .await;
    assert_eq!(task["status"], "Заявка");
    assert_eq!(task["createdBy"], author.as_str());
    settle().await;

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "200");
    assert!(sent[0].1.contains("KV-0001"));

    let response = app
        .clone()
        .oneshot(get_request("/api/notification-logs?type=new_requests"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["logs"][0]["type"], "new_requests");
    assert_eq!(body["logs"][0]["status"], "sent");
    assert_eq!(body["logs"][0]["telegramChatId"], "200");

    cleanup_all_test_data(&pool).await;
}

#[tokio::test]
async fn test_full_approval_latches_bonus_month() {
    let Some(pool) = database_pool().await else {
        return;
    };
    let (app, _) = database_app(pool.clone());

    let task = create_task(
        &app,
        json!({"serviceRegion": "Київський", "workPrice": "1 500", "engineer1": "Петренко"}),
    )
    .await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &uri,
            json!({
                "status": "Виконано",
                "approvedByWarehouse": "Підтверджено",
                "approvedByAccountant": "Підтверджено",
                "approvedByRegionalManager": "Підтверджено"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = parse_response_body(response).await;
    assert_eq!(
        updated["bonusApprovalDate"],
        Utc::now().format("%m-%Y").to_string()
    );
    assert!(updated["autoCompletedAt"].is_string());

    // Approved is terminal.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &uri,
            json!({"approvedByWarehouse": "Відмова"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.clone().oneshot(get_request(&uri)).await.unwrap();
    let stored = parse_response_body(response).await;
    assert_eq!(stored["approvedByWarehouse"], "Підтверджено");
    assert_eq!(stored["bonusApprovalDate"], updated["bonusApprovalDate"]);

    cleanup_all_test_data(&pool).await;
}

#[tokio::test]
async fn test_unknown_task_is_not_found() {
    let Some(pool) = database_pool().await else {
        return;
    };
    let (app, _) = database_app(pool.clone());

    let uri = format!("/api/tasks/{}", uuid::Uuid::new_v4());
    let response = app.oneshot(get_request(&uri)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Users and reference data
// =============================================================================

#[tokio::test]
async fn test_columns_settings_round_trip() {
    let Some(pool) = database_pool().await else {
        return;
    };
    let (app, _) = database_app(pool.clone());

    let login = test_login("cols");
    upsert_user(&app, json!({"login": login, "role": "operator"})).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/users/{}/columns-settings", login),
            json!({"area": "service", "visible": ["client", "status"], "order": ["status", "client"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request(&format!(
            "/api/users/{}/columns-settings/service",
            login
        )))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["visible"], json!(["client", "status"]));
    assert_eq!(body["order"], json!(["status", "client"]));

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/users/nobody_here/columns-settings",
            json!({"area": "service", "visible": [], "order": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    cleanup_all_test_data(&pool).await;
}

#[tokio::test]
async fn test_roles_fall_back_to_user_roles() {
    let Some(pool) = database_pool().await else {
        return;
    };
    let (app, _) = database_app(pool.clone());

    upsert_user(&app, json!({"login": test_login("a"), "role": "warehouse"})).await;
    upsert_user(&app, json!({"login": test_login("b"), "role": "accountant"})).await;

    let response = app.clone().oneshot(get_request("/api/roles")).await.unwrap();
    let body = parse_response_body(response).await;
    let mut names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    names.sort();
    assert_eq!(names, vec!["accountant", "warehouse"]);

    cleanup_all_test_data(&pool).await;
}

// =============================================================================
// Expenses
// =============================================================================

#[tokio::test]
async fn test_copy_previous_month() {
    let Some(pool) = database_pool().await else {
        return;
    };
    let (app, _) = database_app(pool.clone());

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/analytics",
            json!({"region": "Київський", "year": 2024, "month": 3,
                   "expenses": {"salary": 12000.0, "fuel": 3500.5}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let copy = |month: u32| {
        json_request(
            Method::POST,
            "/api/analytics/copy-previous",
            json!({"region": "Київський", "year": 2024, "month": month}),
        )
    };

    let response = app.clone().oneshot(copy(4)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = parse_response_body(response).await;
    assert_eq!(body["month"], 4);
    assert_eq!(body["expenses"], json!({"fuel": 3500.5, "salary": 12000.0}));

    let response = app.clone().oneshot(copy(4)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app.clone().oneshot(copy(6)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    cleanup_all_test_data(&pool).await;
}

#[tokio::test]
async fn test_admin_deletes_expense_record() {
    let Some(pool) = database_pool().await else {
        return;
    };
    let (app, _) = database_app(pool.clone());

    let record = json!({"region": "Одеський", "year": 2024, "month": 5, "expenses": {"rent": 800.0}});
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/analytics", record))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let delete = || {
        json_request(
            Method::DELETE,
            "/api/analytics",
            json!({"region": "Одеський", "year": 2024, "month": 5, "role": "admin"}),
        )
    };
    let response = app.clone().oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    cleanup_all_test_data(&pool).await;
}
