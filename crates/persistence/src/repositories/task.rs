//! Task repository for database operations.

use chrono::NaiveDate;
use shared::period::MonthYear;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use domain::models::task::{RegionFilter, Task, TaskStatus};

use crate::entities::TaskEntity;
use crate::metrics::QueryTimer;

const TASK_COLUMNS: &str = r#"
    id, request_number, request_date, work_date, status, service_region, client,
    company, edrpou, address, request_desc, equipment, invoice, work_price,
    oil_total, filter_sum, fuel_filter_sum, air_filter_sum, antifreeze_sum, other_sum,
    engineer1, engineer2, approved_by_warehouse, warehouse_comment,
    approved_by_accountant, accountant_comment, approved_by_regional_manager,
    regional_manager_comment, bonus_approval_date, created_by, auto_created_at,
    auto_completed_at, extra, created_at, updated_at
"#;

/// Query parameters for listing tasks.
#[derive(Debug, Clone)]
pub struct TaskListQuery {
    pub region: RegionFilter,
    pub status: Option<TaskStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Repository for task database operations.
#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    /// Creates a new TaskRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Find task by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TaskEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_task_by_id");

        let query = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        let result = sqlx::query_as::<_, TaskEntity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;

        timer.record();
        result
    }

    /// List tasks, newest request first.
    ///
    /// Date bounds apply to the work date, falling back to the request date.
    pub async fn list(&self, query: &TaskListQuery) -> Result<Vec<TaskEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_tasks");

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM tasks WHERE TRUE", TASK_COLUMNS));
        if let RegionFilter::AnyOf(regions) = &query.region {
            builder
                .push(" AND btrim(service_region) = ANY(")
                .push_bind(regions.clone())
                .push(")");
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(from) = query.from {
            builder
                .push(" AND COALESCE(work_date, request_date) >= ")
                .push_bind(from);
        }
        if let Some(to) = query.to {
            builder
                .push(" AND COALESCE(work_date, request_date) <= ")
                .push_bind(to);
        }
        builder.push(" ORDER BY request_date DESC NULLS LAST, created_at DESC");

        let result = builder
            .build_query_as::<TaskEntity>()
            .fetch_all(&self.pool)
            .await;

        timer.record();
        result
    }

    /// Tasks relevant to analytics for a region and company.
    ///
    /// Region and company are matched the way the aggregator matches them;
    /// `None` means no restriction.
    pub async fn list_for_analytics(
        &self,
        region: Option<&str>,
        company: Option<&str>,
    ) -> Result<Vec<TaskEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_tasks_for_analytics");

        let query = format!(
            r#"
            SELECT {} FROM tasks
            WHERE ($1::text IS NULL OR lower(btrim(service_region)) = lower(btrim($1)))
              AND ($2::text IS NULL OR btrim(company) = btrim($2))
            "#,
            TASK_COLUMNS
        );
        let result = sqlx::query_as::<_, TaskEntity>(&query)
            .bind(region)
            .bind(company)
            .fetch_all(&self.pool)
            .await;

        timer.record();
        result
    }

    /// Tasks with no bonus month yet.
    pub async fn list_without_bonus_date(&self) -> Result<Vec<TaskEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_tasks_without_bonus_date");

        let query = format!(
            "SELECT {} FROM tasks WHERE bonus_approval_date IS NULL ORDER BY created_at",
            TASK_COLUMNS
        );
        let result = sqlx::query_as::<_, TaskEntity>(&query)
            .fetch_all(&self.pool)
            .await;

        timer.record();
        result
    }

    /// Insert a new task. Returns false if a task with the same id exists.
    pub async fn insert(&self, task: &Task) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("insert_task");

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "INSERT INTO tasks ({}) ",
            TASK_COLUMNS
        ));
        builder.push_values(std::iter::once(task), |mut row, task| {
            row.push_bind(task.id)
                .push_bind(task.request_number.clone())
                .push_bind(task.request_date)
                .push_bind(task.work_date)
                .push_bind(task.status.as_str())
                .push_bind(task.service_region.clone())
                .push_bind(task.client.clone())
                .push_bind(task.company.clone())
                .push_bind(task.edrpou.clone())
                .push_bind(task.address.clone())
                .push_bind(task.request_desc.clone())
                .push_bind(task.equipment.clone())
                .push_bind(task.invoice.clone())
                .push_bind(task.work_price.clone())
                .push_bind(task.materials.oil_total.clone())
                .push_bind(task.materials.filter_sum.clone())
                .push_bind(task.materials.fuel_filter_sum.clone())
                .push_bind(task.materials.air_filter_sum.clone())
                .push_bind(task.materials.antifreeze_sum.clone())
                .push_bind(task.materials.other_sum.clone())
                .push_bind(task.engineer1.clone())
                .push_bind(task.engineer2.clone())
                .push_bind(task.approved_by_warehouse.as_label())
                .push_bind(task.warehouse_comment.clone())
                .push_bind(task.approved_by_accountant.as_label())
                .push_bind(task.accountant_comment.clone())
                .push_bind(task.approved_by_regional_manager.as_label())
                .push_bind(task.regional_manager_comment.clone())
                .push_bind(task.bonus_approval_date.map(|p| p.to_string()))
                .push_bind(task.created_by.clone())
                .push_bind(task.auto_created_at)
                .push_bind(task.auto_completed_at)
                .push_bind(task.extra.clone())
                .push_bind(task.created_at)
                .push_bind(task.updated_at);
        });
        builder.push(" ON CONFLICT (id) DO NOTHING");

        let result = builder.build().execute(&self.pool).await;

        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Persist every mutable column of an existing task.
    ///
    /// `bonus_approval_date` is only written when the stored value is NULL,
    /// so a latched month is never overwritten.
    pub async fn update(&self, task: &Task) -> Result<Option<TaskEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_task");

        let query = format!(
            r#"
            UPDATE tasks SET
                request_number = $2, request_date = $3, work_date = $4, status = $5,
                service_region = $6, client = $7, company = $8, edrpou = $9,
                address = $10, request_desc = $11, equipment = $12, invoice = $13,
                work_price = $14, oil_total = $15, filter_sum = $16, fuel_filter_sum = $17,
                air_filter_sum = $18, antifreeze_sum = $19, other_sum = $20,
                engineer1 = $21, engineer2 = $22,
                approved_by_warehouse = $23, warehouse_comment = $24,
                approved_by_accountant = $25, accountant_comment = $26,
                approved_by_regional_manager = $27, regional_manager_comment = $28,
                bonus_approval_date = COALESCE(bonus_approval_date, $29),
                auto_completed_at = $30, extra = $31, updated_at = $32
            WHERE id = $1
            RETURNING {}
            "#,
            TASK_COLUMNS
        );
        let result = sqlx::query_as::<_, TaskEntity>(&query)
            .bind(task.id)
            .bind(&task.request_number)
            .bind(task.request_date)
            .bind(task.work_date)
            .bind(task.status.as_str())
            .bind(&task.service_region)
            .bind(&task.client)
            .bind(&task.company)
            .bind(&task.edrpou)
            .bind(&task.address)
            .bind(&task.request_desc)
            .bind(&task.equipment)
            .bind(&task.invoice)
            .bind(&task.work_price)
            .bind(&task.materials.oil_total)
            .bind(&task.materials.filter_sum)
            .bind(&task.materials.fuel_filter_sum)
            .bind(&task.materials.air_filter_sum)
            .bind(&task.materials.antifreeze_sum)
            .bind(&task.materials.other_sum)
            .bind(&task.engineer1)
            .bind(&task.engineer2)
            .bind(task.approved_by_warehouse.as_label())
            .bind(&task.warehouse_comment)
            .bind(task.approved_by_accountant.as_label())
            .bind(&task.accountant_comment)
            .bind(task.approved_by_regional_manager.as_label())
            .bind(&task.regional_manager_comment)
            .bind(task.bonus_approval_date.map(|p| p.to_string()))
            .bind(task.auto_completed_at)
            .bind(&task.extra)
            .bind(task.updated_at)
            .fetch_optional(&self.pool)
            .await;

        timer.record();
        result
    }

    /// Set the bonus month if none is stored. Returns whether a row changed.
    pub async fn set_bonus_approval_date(&self, id: Uuid, period: MonthYear) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("set_task_bonus_approval_date");

        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET bonus_approval_date = $2, updated_at = NOW()
            WHERE id = $1 AND bonus_approval_date IS NULL
            "#,
        )
        .bind(id)
        .bind(period.to_string())
        .execute(&self.pool)
        .await;

        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}
