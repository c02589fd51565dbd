//! User endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::user::{ColumnsSettings, ListUsersQuery, SaveColumnsRequest, UpsertUserRequest};
use domain::models::User;
use persistence::repositories::{UserRepository, UserUpsertInput};
use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ApiJson;

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// List users.
///
/// GET /api/users?includeDismissed=true
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let users = repo.list(query.include_dismissed).await?;
    Ok(Json(users.into_iter().map(User::from).collect()))
}

/// Create or update a user by login.
///
/// POST /api/users
pub async fn upsert_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpsertUserRequest>,
) -> Result<Json<User>, ApiError> {
    request.validate()?;

    let repo = UserRepository::new(state.pool.clone());
    let entity = repo
        .upsert(UserUpsertInput {
            login: request.login,
            name: trimmed(request.name),
            role: request.role.trim().to_string(),
            region: trimmed(request.region),
            telegram_chat_id: trimmed(request.telegram_chat_id),
            dismissed: request.dismissed,
            notification_settings: request.notification_settings,
        })
        .await?;

    let user: User = entity.into();
    info!(login = %user.login, role = %user.role, "User saved");
    Ok(Json(user))
}

/// Column settings for one table area; empty settings when none are stored.
///
/// GET /api/users/:login/columns-settings/:area
pub async fn get_columns_settings(
    State(state): State<AppState>,
    Path((login, area)): Path<(String, String)>,
) -> Result<Json<ColumnsSettings>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let settings = repo
        .get_columns_settings(&login, &area)
        .await?
        .flatten()
        .unwrap_or_default();
    Ok(Json(settings))
}

/// Save column settings for one table area.
///
/// POST /api/users/:login/columns-settings
pub async fn save_columns_settings(
    State(state): State<AppState>,
    Path(login): Path<String>,
    ApiJson(request): ApiJson<SaveColumnsRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    request.validate()?;

    let (area, settings) = request.into_parts();
    let repo = UserRepository::new(state.pool.clone());
    if !repo.save_columns_settings(&login, &area, &settings).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!(login = %login, area = %area, columns = settings.visible.len(), "Column settings saved");
    Ok(Json(SuccessResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trimmed() {
        assert_eq!(trimmed(Some("  Київ ".to_string())), Some("Київ".to_string()));
        assert_eq!(trimmed(Some("   ".to_string())), None);
        assert_eq!(trimmed(None), None);
    }
}
