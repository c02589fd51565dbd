//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub login: String,
    pub name: Option<String>,
    pub role: String,
    pub region: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub dismissed: bool,
    pub columns_settings: serde_json::Value,
    pub notification_settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserEntity {
    /// Convert to domain model.
    ///
    /// Malformed JSON columns fall back to defaults. Unknown notification
    /// keys are dropped rather than failing the whole row.
    pub fn into_domain(self) -> domain::models::User {
        let columns_settings = serde_json::from_value(self.columns_settings).unwrap_or_default();
        let notification_settings = parse_settings(self.notification_settings);

        domain::models::User {
            id: self.id,
            login: self.login,
            name: self.name,
            role: self.role,
            region: self.region,
            telegram_chat_id: self.telegram_chat_id,
            dismissed: self.dismissed,
            columns_settings,
            notification_settings,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn parse_settings(value: serde_json::Value) -> domain::models::NotificationSettings {
    use domain::models::{NotificationKind, NotificationSettings};

    let mut settings = NotificationSettings::default();
    if let serde_json::Value::Object(map) = value {
        for (key, enabled) in map {
            if let (Ok(kind), Some(enabled)) = (key.parse::<NotificationKind>(), enabled.as_bool()) {
                settings.set(kind, enabled);
            }
        }
    }
    settings
}

impl From<UserEntity> for domain::models::User {
    fn from(entity: UserEntity) -> Self {
        entity.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::NotificationKind;
    use serde_json::json;

    fn create_test_entity() -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            login: "ivan".to_string(),
            name: Some("Іван Петренко".to_string()),
            role: "service".to_string(),
            region: Some("Київський".to_string()),
            telegram_chat_id: Some("123456".to_string()),
            dismissed: false,
            columns_settings: json!({"service": {"visible": ["client"], "order": ["client"], "widths": {}}}),
            notification_settings: json!({"newRequests": true, "rejectedRequests": false}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_entity_to_domain() {
        let entity = create_test_entity();
        let user: domain::models::User = entity.clone().into();

        assert_eq!(user.id, entity.id);
        assert_eq!(user.login, "ivan");
        assert!(user.notification_settings.get(NotificationKind::NewRequests));
        assert!(!user.notification_settings.get(NotificationKind::RejectedRequests));
        assert_eq!(user.columns_settings["service"].visible, vec!["client".to_string()]);
    }

    #[test]
    fn test_legacy_and_unknown_settings_keys() {
        let mut entity = create_test_entity();
        entity.notification_settings = json!({
            "pending_approval": true,
            "somethingElse": true,
            "approvedRequests": "yes"
        });

        let user = entity.into_domain();
        assert!(user.notification_settings.get(NotificationKind::PendingApproval));
        assert!(!user.notification_settings.get(NotificationKind::ApprovedRequests));
    }

    #[test]
    fn test_malformed_columns_default() {
        let mut entity = create_test_entity();
        entity.columns_settings = json!([1, 2, 3]);
        assert!(entity.into_domain().columns_settings.is_empty());
    }
}
