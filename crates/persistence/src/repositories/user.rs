//! User repository for database operations.

use sqlx::types::Json;
use sqlx::PgPool;

use domain::models::notification::{NotificationKind, NotificationSettings};
use domain::models::user::ColumnsSettings;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

const USER_COLUMNS: &str = r#"
    id, login, name, role, region, telegram_chat_id, dismissed,
    columns_settings, notification_settings, created_at, updated_at
"#;

/// Input data for creating or updating a user by login.
#[derive(Debug, Clone)]
pub struct UserUpsertInput {
    pub login: String,
    pub name: Option<String>,
    pub role: String,
    pub region: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub dismissed: bool,
    /// `None` keeps the stored settings on update.
    pub notification_settings: Option<NotificationSettings>,
}

/// Repository for user database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// List users ordered by login.
    pub async fn list(&self, include_dismissed: bool) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_users");

        let query = format!(
            "SELECT {} FROM users WHERE ($1 OR NOT dismissed) ORDER BY login",
            USER_COLUMNS
        );
        let result = sqlx::query_as::<_, UserEntity>(&query)
            .bind(include_dismissed)
            .fetch_all(&self.pool)
            .await;

        timer.record();
        result
    }

    /// Find user by login.
    pub async fn find_by_login(&self, login: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_login");

        let query = format!("SELECT {} FROM users WHERE login = $1", USER_COLUMNS);
        let result = sqlx::query_as::<_, UserEntity>(&query)
            .bind(login)
            .fetch_optional(&self.pool)
            .await;

        timer.record();
        result
    }

    /// Users that may receive `kind`: subscribed and with a usable chat id.
    ///
    /// The recipient resolver applies the same rules again; this only trims the
    /// candidate set.
    pub async fn list_notification_candidates(
        &self,
        kind: NotificationKind,
    ) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_notification_candidates");

        let query = format!(
            r#"
            SELECT {} FROM users
            WHERE telegram_chat_id IS NOT NULL
              AND btrim(telegram_chat_id) NOT IN ('', 'Chat ID')
              AND (notification_settings ->> $1) = 'true'
            ORDER BY login
            "#,
            USER_COLUMNS
        );
        let result = sqlx::query_as::<_, UserEntity>(&query)
            .bind(kind.settings_key())
            .fetch_all(&self.pool)
            .await;

        timer.record();
        result
    }

    /// Create the user or update the existing row with the same login.
    pub async fn upsert(&self, input: UserUpsertInput) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_user");

        let query = format!(
            r#"
            INSERT INTO users (login, name, role, region, telegram_chat_id, dismissed, notification_settings)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, '{{}}'::jsonb))
            ON CONFLICT (login) DO UPDATE SET
                name = EXCLUDED.name,
                role = EXCLUDED.role,
                region = EXCLUDED.region,
                telegram_chat_id = EXCLUDED.telegram_chat_id,
                dismissed = EXCLUDED.dismissed,
                notification_settings = COALESCE($7, users.notification_settings),
                updated_at = NOW()
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let result = sqlx::query_as::<_, UserEntity>(&query)
            .bind(&input.login)
            .bind(&input.name)
            .bind(&input.role)
            .bind(&input.region)
            .bind(&input.telegram_chat_id)
            .bind(input.dismissed)
            .bind(input.notification_settings.map(Json))
            .fetch_one(&self.pool)
            .await;

        timer.record();
        result
    }

    /// Stored column settings for one area. Outer `None` means unknown user.
    pub async fn get_columns_settings(
        &self,
        login: &str,
        area: &str,
    ) -> Result<Option<Option<ColumnsSettings>>, sqlx::Error> {
        let timer = QueryTimer::new("get_columns_settings");

        let result: Result<Option<(Option<serde_json::Value>,)>, sqlx::Error> =
            sqlx::query_as("SELECT columns_settings -> $2 FROM users WHERE login = $1")
                .bind(login)
                .bind(area)
                .fetch_optional(&self.pool)
                .await;

        timer.record();
        Ok(result?.map(|(value,)| value.and_then(|v| serde_json::from_value(v).ok())))
    }

    /// Save column settings for one area. Returns false for an unknown user.
    pub async fn save_columns_settings(
        &self,
        login: &str,
        area: &str,
        settings: &ColumnsSettings,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("save_columns_settings");

        let result = sqlx::query(
            r#"
            UPDATE users
            SET columns_settings = jsonb_set(columns_settings, ARRAY[$2], $3, true),
                updated_at = NOW()
            WHERE login = $1
            "#,
        )
        .bind(login)
        .bind(area)
        .bind(Json(settings))
        .execute(&self.pool)
        .await;

        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Distinct non-empty roles of all users.
    pub async fn distinct_roles(&self) -> Result<Vec<String>, sqlx::Error> {
        let timer = QueryTimer::new("distinct_user_roles");

        let result: Result<Vec<(String,)>, sqlx::Error> = sqlx::query_as(
            "SELECT DISTINCT btrim(role) FROM users WHERE btrim(role) <> '' ORDER BY 1",
        )
        .fetch_all(&self.pool)
        .await;

        timer.record();
        Ok(result?.into_iter().map(|(role,)| role).collect())
    }

    /// Distinct non-empty regions of all users, as stored.
    pub async fn distinct_regions(&self) -> Result<Vec<String>, sqlx::Error> {
        let timer = QueryTimer::new("distinct_user_regions");

        let result: Result<Vec<(String,)>, sqlx::Error> = sqlx::query_as(
            "SELECT DISTINCT btrim(region) FROM users WHERE region IS NOT NULL AND btrim(region) <> '' ORDER BY 1",
        )
        .fetch_all(&self.pool)
        .await;

        timer.record();
        Ok(result?.into_iter().map(|(region,)| region).collect())
    }
}
