//! Reference data endpoints: roles, regions and access rules.

use axum::{extract::State, Json};
use domain::models::reference::{merge_default_regions, roles_from_users, AccessRules, Region, Role};
use persistence::repositories::{ReferenceRepository, UserRepository};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ApiJson;
use crate::routes::users::SuccessResponse;

/// Stored roles, or the distinct roles of users when none are stored.
///
/// GET /api/roles
pub async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<Role>>, ApiError> {
    let repo = ReferenceRepository::new(state.pool.clone());
    let stored = repo.list_roles().await?;
    if !stored.is_empty() {
        return Ok(Json(stored.into_iter().map(Role::from).collect()));
    }

    let user_roles = UserRepository::new(state.pool.clone()).distinct_roles().await?;
    Ok(Json(roles_from_users(user_roles.iter().map(String::as_str))))
}

/// Replace the role list.
///
/// POST /api/roles
pub async fn save_roles(
    State(state): State<AppState>,
    ApiJson(roles): ApiJson<Vec<Role>>,
) -> Result<Json<SuccessResponse>, ApiError> {
    for role in &roles {
        role.validate()?;
    }

    ReferenceRepository::new(state.pool.clone())
        .replace_roles(&roles)
        .await?;

    info!(count = roles.len(), "Roles replaced");
    Ok(Json(SuccessResponse { success: true }))
}

/// Stored regions, or the defaults merged with the regions of users.
///
/// GET /api/regions
pub async fn list_regions(State(state): State<AppState>) -> Result<Json<Vec<Region>>, ApiError> {
    let repo = ReferenceRepository::new(state.pool.clone());
    let stored = repo.list_regions().await?;
    if !stored.is_empty() {
        return Ok(Json(stored.into_iter().map(Region::from).collect()));
    }

    let user_regions = UserRepository::new(state.pool.clone()).distinct_regions().await?;
    Ok(Json(merge_default_regions(user_regions.iter().map(String::as_str))))
}

/// Replace the region list.
///
/// POST /api/regions
pub async fn save_regions(
    State(state): State<AppState>,
    ApiJson(regions): ApiJson<Vec<Region>>,
) -> Result<Json<SuccessResponse>, ApiError> {
    for region in &regions {
        region.validate()?;
    }

    ReferenceRepository::new(state.pool.clone())
        .replace_regions(&regions)
        .await?;

    info!(count = regions.len(), "Regions replaced");
    Ok(Json(SuccessResponse { success: true }))
}

/// Access rules document; created empty on first read.
///
/// GET /api/accessRules
pub async fn get_access_rules(State(state): State<AppState>) -> Result<Json<AccessRules>, ApiError> {
    let rules = ReferenceRepository::new(state.pool.clone())
        .get_or_create_access_rules()
        .await?;
    Ok(Json(rules))
}

/// Replace the access rules document. The body must be a JSON object.
///
/// POST /api/accessRules
pub async fn save_access_rules(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let rules = into_rules(body)?;

    ReferenceRepository::new(state.pool.clone())
        .save_access_rules(&rules)
        .await?;

    info!(keys = rules.len(), "Access rules replaced");
    Ok(Json(SuccessResponse { success: true }))
}

fn into_rules(body: serde_json::Value) -> Result<AccessRules, ApiError> {
    match body {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(ApiError::Validation(
            "Access rules must be a JSON object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_rules_accepts_objects_only() {
        assert!(into_rules(json!({"admin": {"tasks": "write"}})).is_ok());
        assert!(into_rules(json!([1, 2])).is_err());
        assert!(into_rules(json!("rules")).is_err());
        assert!(into_rules(json!(null)).is_err());
    }
}
