//! Repository for configuration documents and reference data: expense
//! categories, roles, regions and access rules.

use sqlx::types::Json;
use sqlx::PgPool;

use domain::models::analytics::CategoryConfig;
use domain::models::reference::{AccessRules, Region, Role};

use crate::entities::{RegionEntity, RoleEntity};
use crate::metrics::QueryTimer;

/// Repository for reference data.
#[derive(Clone)]
pub struct ReferenceRepository {
    pool: PgPool,
}

impl ReferenceRepository {
    /// Creates a new ReferenceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stored category configuration, if any.
    pub async fn get_categories(&self) -> Result<Option<CategoryConfig>, sqlx::Error> {
        let timer = QueryTimer::new("get_expense_categories");

        let result: Result<Option<(serde_json::Value,)>, sqlx::Error> =
            sqlx::query_as("SELECT categories FROM expense_categories WHERE id = 1")
                .fetch_optional(&self.pool)
                .await;

        timer.record();
        Ok(result?.and_then(|(value,)| {
            serde_json::from_value(serde_json::json!({ "categories": value })).ok()
        }))
    }

    /// Replace the category configuration.
    pub async fn save_categories(&self, config: &CategoryConfig) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("save_expense_categories");

        let result = sqlx::query(
            r#"
            INSERT INTO expense_categories (id, categories) VALUES (1, $1)
            ON CONFLICT (id) DO UPDATE SET categories = EXCLUDED.categories, updated_at = NOW()
            "#,
        )
        .bind(Json(&config.categories))
        .execute(&self.pool)
        .await;

        timer.record();
        result.map(|_| ())
    }

    /// Stored roles in saved order.
    pub async fn list_roles(&self) -> Result<Vec<RoleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_roles");

        let result = sqlx::query_as::<_, RoleEntity>(
            "SELECT name, permissions FROM roles ORDER BY position, name",
        )
        .fetch_all(&self.pool)
        .await;

        timer.record();
        result
    }

    /// Replace all roles.
    pub async fn replace_roles(&self, roles: &[Role]) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("replace_roles");

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM roles").execute(&mut *tx).await?;
        for (position, role) in roles.iter().enumerate() {
            sqlx::query("INSERT INTO roles (name, permissions, position) VALUES ($1, $2, $3)")
                .bind(&role.name)
                .bind(&role.permissions)
                .bind(position as i32)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        timer.record();
        Ok(())
    }

    /// Stored regions in saved order.
    pub async fn list_regions(&self) -> Result<Vec<RegionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_regions");

        let result =
            sqlx::query_as::<_, RegionEntity>("SELECT name FROM regions ORDER BY position, name")
                .fetch_all(&self.pool)
                .await;

        timer.record();
        result
    }

    /// Replace all regions.
    pub async fn replace_regions(&self, regions: &[Region]) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("replace_regions");

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM regions").execute(&mut *tx).await?;
        for (position, region) in regions.iter().enumerate() {
            sqlx::query(
                "INSERT INTO regions (name, position) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
            )
            .bind(region.name.trim())
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        timer.record();
        Ok(())
    }

    /// Access rules, creating an empty document if none exists.
    pub async fn get_or_create_access_rules(&self) -> Result<AccessRules, sqlx::Error> {
        let timer = QueryTimer::new("get_or_create_access_rules");

        sqlx::query("INSERT INTO access_rules (id) VALUES (1) ON CONFLICT (id) DO NOTHING")
            .execute(&self.pool)
            .await?;
        let result: Result<(serde_json::Value,), sqlx::Error> =
            sqlx::query_as("SELECT rules FROM access_rules WHERE id = 1")
                .fetch_one(&self.pool)
                .await;

        timer.record();
        Ok(match result?.0 {
            serde_json::Value::Object(map) => map,
            _ => AccessRules::new(),
        })
    }

    /// Replace the access rules document.
    pub async fn save_access_rules(&self, rules: &AccessRules) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("save_access_rules");

        let result = sqlx::query(
            r#"
            INSERT INTO access_rules (id, rules) VALUES (1, $1)
            ON CONFLICT (id) DO UPDATE SET rules = EXCLUDED.rules, updated_at = NOW()
            "#,
        )
        .bind(Json(rules))
        .execute(&self.pool)
        .await;

        timer.record();
        result.map(|_| ())
    }
}
