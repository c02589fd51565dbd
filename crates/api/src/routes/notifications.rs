//! Notification log, system broadcast and Telegram diagnostics endpoints.

use axum::{
    extract::{Query, State},
    http::Extensions,
    Json,
};
use domain::models::notification::{NotificationKind, NotificationLog, NotificationLogPage, NotificationLogQuery};
use domain::services::{DeliveryOutcome, NotificationPayload};
use persistence::repositories::NotificationLogRepository;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ApiJson;
use crate::middleware::trace_id::get_request_id;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SystemMessageRequest {
    #[validate(length(min = 1, max = 4000, message = "Message is required"))]
    pub message: String,
    pub author_login: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMessageResponse {
    pub success: bool,
    pub attempted: usize,
    pub sent_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramStatusResponse {
    pub bot_token_configured: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TelegramTestRequest {
    #[validate(length(min = 1, max = 64, message = "chatId is required"))]
    pub chat_id: String,
    #[validate(length(min = 1, max = 4000, message = "Message is required"))]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TelegramTestResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn require_bot_token(state: &AppState) -> Result<(), ApiError> {
    if state.dispatcher.sender().is_configured() {
        Ok(())
    } else {
        Err(ApiError::Validation("Telegram bot token is not configured".to_string()))
    }
}

/// Page through the delivery log, newest first.
///
/// GET /api/notification-logs?page&limit&type
pub async fn list_notification_logs(
    State(state): State<AppState>,
    Query(query): Query<NotificationLogQuery>,
) -> Result<Json<NotificationLogPage>, ApiError> {
    let repo = NotificationLogRepository::new(state.pool.clone());
    let (page, limit) = (query.page(), query.limit());

    let logs = repo.list(query.kind, limit as i64, query.offset()).await?;
    let total = repo.count(query.kind).await?;

    Ok(Json(NotificationLogPage::new(
        logs.into_iter().map(NotificationLog::from).collect(),
        total,
        page,
        limit,
    )))
}

/// Broadcast an administrator message to every `systemNotifications` subscriber.
///
/// POST /api/notifications/send-system-message
pub async fn send_system_message(
    State(state): State<AppState>,
    extensions: Extensions,
    ApiJson(request): ApiJson<SystemMessageRequest>,
) -> Result<Json<SystemMessageResponse>, ApiError> {
    request.validate()?;
    require_bot_token(&state)?;

    let payload = NotificationPayload::system_message(request.message.trim(), request.author_login);
    let summary = state
        .dispatcher
        .dispatch(NotificationKind::SystemNotifications, payload)
        .await;

    info!(
        request_id = %get_request_id(&extensions),
        attempted = summary.attempted,
        sent = summary.sent,
        "System message broadcast"
    );
    Ok(Json(SystemMessageResponse {
        success: true,
        attempted: summary.attempted,
        sent_count: summary.sent,
    }))
}

/// GET /api/telegram/status
pub async fn telegram_status(State(state): State<AppState>) -> Json<TelegramStatusResponse> {
    Json(TelegramStatusResponse {
        bot_token_configured: state.dispatcher.sender().is_configured(),
    })
}

/// Send one test message directly, bypassing recipient resolution and the log.
///
/// POST /api/telegram/test
pub async fn telegram_test(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TelegramTestRequest>,
) -> Result<Json<TelegramTestResponse>, ApiError> {
    request.validate()?;
    require_bot_token(&state)?;

    let html = shared::html::escape(&request.message);
    let response = match state.dispatcher.sender().send(request.chat_id.trim(), &html).await {
        DeliveryOutcome::Sent => TelegramTestResponse {
            success: true,
            error: None,
        },
        DeliveryOutcome::Failed(reason) => TelegramTestResponse {
            success: false,
            error: Some(reason),
        },
    };
    Ok(Json(response))
}
