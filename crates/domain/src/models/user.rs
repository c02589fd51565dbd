//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::validate_login;
use std::collections::HashMap;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::notification::NotificationSettings;

/// Region value that matches every other region.
pub const ALL_REGIONS: &str = "Україна";

/// Placeholder the UI stores when no chat id was entered.
const CHAT_ID_PLACEHOLDER: &str = "Chat ID";

/// Roles allowed to delete expense records.
pub const EXPENSE_ADMIN_ROLES: &[&str] = &["admin", "administrator", "regionalManager", "regkerivn"];

/// Per-area table layout preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnsSettings {
    #[serde(default)]
    pub visible: Vec<String>,
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default)]
    pub widths: HashMap<String, serde_json::Value>,
}

/// A person using the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub name: Option<String>,
    pub role: String,
    pub region: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub dismissed: bool,
    pub columns_settings: HashMap<String, ColumnsSettings>,
    pub notification_settings: NotificationSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Chat id usable for delivery, if any.
    pub fn usable_chat_id(&self) -> Option<&str> {
        usable_chat_id(self.telegram_chat_id.as_deref())
    }

    /// Whether the user's region is the all-regions wildcard.
    pub fn covers_all_regions(&self) -> bool {
        self.region.as_deref().map(str::trim) == Some(ALL_REGIONS)
    }
}

/// Normalizes a stored chat id: blank values and the UI placeholder mean absent.
pub fn usable_chat_id(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|id| !id.is_empty() && *id != CHAT_ID_PLACEHOLDER)
}

/// Whether the role may delete expense records.
pub fn can_delete_expenses(role: &str) -> bool {
    EXPENSE_ADMIN_ROLES.contains(&role.trim())
}

/// Request payload for creating or updating a user (upsert by login).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUserRequest {
    #[validate(
        length(min = 1, max = 100, message = "Login must be 1-100 characters"),
        custom(function = "validate_login")
    )]
    pub login: String,
    #[validate(length(max = 200, message = "Name must be at most 200 characters"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_role"))]
    pub role: String,
    pub region: Option<String>,
    pub telegram_chat_id: Option<String>,
    #[serde(default)]
    pub dismissed: bool,
    /// Unknown keys inside fail deserialization.
    pub notification_settings: Option<NotificationSettings>,
}

fn validate_role(role: &str) -> Result<(), ValidationError> {
    if role.trim().is_empty() {
        let mut err = ValidationError::new("role_required");
        err.message = Some("Role is required".into());
        return Err(err);
    }
    Ok(())
}

/// Query parameters for listing users.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    #[serde(default)]
    pub include_dismissed: bool,
}

/// Request payload for saving one area's column settings.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveColumnsRequest {
    #[validate(length(min = 1, max = 100, message = "Area is required"))]
    pub area: String,
    pub visible: Vec<String>,
    pub order: Vec<String>,
    #[serde(default)]
    pub widths: HashMap<String, serde_json::Value>,
}

impl SaveColumnsRequest {
    pub fn into_parts(self) -> (String, ColumnsSettings) {
        (
            self.area,
            ColumnsSettings {
                visible: self.visible,
                order: self.order,
                widths: self.widths,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_usable_chat_id() {
        assert_eq!(usable_chat_id(Some(" 12345 ")), Some("12345"));
        assert_eq!(usable_chat_id(Some("")), None);
        assert_eq!(usable_chat_id(Some("Chat ID")), None);
        assert_eq!(usable_chat_id(None), None);
    }

    #[test]
    fn test_can_delete_expenses() {
        assert!(can_delete_expenses("admin"));
        assert!(can_delete_expenses("regkerivn"));
        assert!(!can_delete_expenses("service"));
        assert!(!can_delete_expenses(""));
    }

    #[test]
    fn test_upsert_rejects_unknown_settings_key() {
        let result: Result<UpsertUserRequest, _> = serde_json::from_value(json!({
            "login": "ivan",
            "role": "service",
            "notificationSettings": {"newRequests": true, "coffeeBreaks": true}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_upsert_validation() {
        let req: UpsertUserRequest = serde_json::from_value(json!({
            "login": " ivan",
            "role": ""
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("login"));
        assert!(fields.contains_key("role"));
    }

    #[test]
    fn test_upsert_accepts_generated_user() {
        use fake::faker::internet::en::Username;
        use fake::faker::name::en::Name;
        use fake::Fake;

        let req: UpsertUserRequest = serde_json::from_value(json!({
            "login": Username().fake::<String>(),
            "name": Name().fake::<String>(),
            "role": "service",
            "region": "Київський",
            "notificationSettings": {"newRequests": true}
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(req.notification_settings.unwrap().new_requests);
    }

    #[test]
    fn test_columns_request_requires_arrays() {
        let result: Result<SaveColumnsRequest, _> =
            serde_json::from_value(json!({"area": "service", "visible": "a"}));
        assert!(result.is_err());

        let req: SaveColumnsRequest = serde_json::from_value(json!({
            "area": "service",
            "visible": ["client"],
            "order": ["client"]
        }))
        .unwrap();
        let (area, settings) = req.into_parts();
        assert_eq!(area, "service");
        assert!(settings.widths.is_empty());
    }
}
