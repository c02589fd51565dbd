use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::NotificationSender;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{analytics, expense_categories, health, notifications, reference, tasks, users};
use crate::services::{NotificationDispatcher, PgNotificationStore, TelegramClient, TelegramError};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub dispatcher: NotificationDispatcher,
}

/// Builds the router with Telegram delivery configured from `config`.
pub fn create_app(config: Config, pool: PgPool) -> Result<Router, TelegramError> {
    let sender = TelegramClient::new(&config.telegram)?;
    if !sender.is_configured() {
        tracing::warn!("Telegram bot token not configured; notifications will be logged as failed");
    }
    Ok(create_app_with_sender(config, pool, Arc::new(sender)))
}

/// Builds the router with an explicit notification sender.
pub fn create_app_with_sender(
    config: Config,
    pool: PgPool,
    sender: Arc<dyn NotificationSender>,
) -> Router {
    let config = Arc::new(config);
    let store = Arc::new(PgNotificationStore::new(pool.clone()));

    let state = AppState {
        pool,
        config: config.clone(),
        dispatcher: NotificationDispatcher::new(store, sender),
    };

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    let task_routes = Router::new()
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route("/api/tasks/:id", get(tasks::get_task).put(tasks::update_task));

    let user_routes = Router::new()
        .route("/api/users", get(users::list_users).post(users::upsert_user))
        .route(
            "/api/users/:login/columns-settings",
            post(users::save_columns_settings),
        )
        .route(
            "/api/users/:login/columns-settings/:area",
            get(users::get_columns_settings),
        );

    let reference_routes = Router::new()
        .route("/api/roles", get(reference::list_roles).post(reference::save_roles))
        .route(
            "/api/regions",
            get(reference::list_regions).post(reference::save_regions),
        )
        .route(
            "/api/accessRules",
            get(reference::get_access_rules).post(reference::save_access_rules),
        );

    let analytics_routes = Router::new()
        .route(
            "/api/analytics",
            get(analytics::list_expenses)
                .post(analytics::save_expenses)
                .delete(analytics::delete_expenses),
        )
        .route("/api/analytics/full", get(analytics::full_analytics))
        .route("/api/analytics/details", get(analytics::revenue_details_handler))
        .route(
            "/api/analytics/employee-rating",
            get(analytics::employee_rating_handler),
        )
        .route("/api/analytics/copy-previous", post(analytics::copy_previous))
        .route(
            "/api/expense-categories",
            get(expense_categories::get_categories).post(expense_categories::save_categories),
        )
        .route(
            "/api/expense-categories/cleanup",
            post(expense_categories::cleanup_categories),
        );

    let notification_routes = Router::new()
        .route(
            "/api/notification-logs",
            get(notifications::list_notification_logs),
        )
        .route(
            "/api/notifications/send-system-message",
            post(notifications::send_system_message),
        )
        .route("/api/telegram/status", get(notifications::telegram_status))
        .route("/api/telegram/test", post(notifications::telegram_test));

    Router::new()
        .merge(public_routes)
        .merge(task_routes)
        .merge(user_routes)
        .merge(reference_routes)
        .merge(analytics_routes)
        .merge(notification_routes)
        // Global middleware (bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
