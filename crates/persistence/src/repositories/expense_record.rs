//! Expense record repository for database operations.

use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeMap;

use domain::models::analytics::ExpenseKey;
use shared::period::MonthYear;

use crate::entities::ExpenseRecordEntity;
use crate::metrics::QueryTimer;

const EXPENSE_COLUMNS: &str =
    "id, region, company, year, month, expenses, created_by, created_at, updated_at";

/// Repository for monthly expense records.
#[derive(Clone)]
pub struct ExpenseRecordRepository {
    pool: PgPool,
}

impl ExpenseRecordRepository {
    /// Creates a new ExpenseRecordRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records between `start` and `end` inclusive, optionally for one region and company.
    pub async fn list_in_range(
        &self,
        region: Option<&str>,
        company: Option<&str>,
        start: MonthYear,
        end: MonthYear,
    ) -> Result<Vec<ExpenseRecordEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_expense_records_in_range");

        let query = format!(
            r#"
            SELECT {} FROM expense_records
            WHERE ($1::text IS NULL OR lower(btrim(region)) = lower(btrim($1)))
              AND ($2::text IS NULL OR company = btrim($2))
              AND (year * 12 + month) BETWEEN $3 AND $4
            ORDER BY year, month, region, company
            "#,
            EXPENSE_COLUMNS
        );
        let result = sqlx::query_as::<_, ExpenseRecordEntity>(&query)
            .bind(region)
            .bind(company)
            .bind(start.year * 12 + start.month as i32)
            .bind(end.year * 12 + end.month as i32)
            .fetch_all(&self.pool)
            .await;

        timer.record();
        result
    }

    /// Every stored record.
    pub async fn list_all(&self) -> Result<Vec<ExpenseRecordEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_all_expense_records");

        let query = format!("SELECT {} FROM expense_records ORDER BY year, month", EXPENSE_COLUMNS);
        let result = sqlx::query_as::<_, ExpenseRecordEntity>(&query)
            .fetch_all(&self.pool)
            .await;

        timer.record();
        result
    }

    /// Find the record for a region, company and month.
    pub async fn find(&self, key: &ExpenseKey) -> Result<Option<ExpenseRecordEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_expense_record");

        let query = format!(
            "SELECT {} FROM expense_records WHERE region = $1 AND company = $2 AND year = $3 AND month = $4",
            EXPENSE_COLUMNS
        );
        let result = sqlx::query_as::<_, ExpenseRecordEntity>(&query)
            .bind(&key.region)
            .bind(&key.company)
            .bind(key.year)
            .bind(key.month as i32)
            .fetch_optional(&self.pool)
            .await;

        timer.record();
        result
    }

    /// Create or replace the record for a month.
    pub async fn upsert(
        &self,
        key: &ExpenseKey,
        expenses: &BTreeMap<String, f64>,
        created_by: Option<&str>,
    ) -> Result<ExpenseRecordEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_expense_record");

        let query = format!(
            r#"
            INSERT INTO expense_records (region, company, year, month, expenses, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (region, company, year, month) DO UPDATE SET
                expenses = EXCLUDED.expenses,
                updated_at = NOW()
            RETURNING {}
            "#,
            EXPENSE_COLUMNS
        );
        let result = sqlx::query_as::<_, ExpenseRecordEntity>(&query)
            .bind(&key.region)
            .bind(&key.company)
            .bind(key.year)
            .bind(key.month as i32)
            .bind(Json(expenses))
            .bind(created_by)
            .fetch_one(&self.pool)
            .await;

        timer.record();
        result
    }

    /// Create the record unless one already exists for the month.
    ///
    /// Returns `None` when a concurrent writer got there first; the existing
    /// record is left untouched.
    pub async fn insert_if_absent(
        &self,
        key: &ExpenseKey,
        expenses: &BTreeMap<String, f64>,
        created_by: Option<&str>,
    ) -> Result<Option<ExpenseRecordEntity>, sqlx::Error> {
        let timer = QueryTimer::new("insert_expense_record_if_absent");

        let query = format!(
            r#"
            INSERT INTO expense_records (region, company, year, month, expenses, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (region, company, year, month) DO NOTHING
            RETURNING {}
            "#,
            EXPENSE_COLUMNS
        );
        let result = sqlx::query_as::<_, ExpenseRecordEntity>(&query)
            .bind(&key.region)
            .bind(&key.company)
            .bind(key.year)
            .bind(key.month as i32)
            .bind(Json(expenses))
            .bind(created_by)
            .fetch_optional(&self.pool)
            .await;

        timer.record();
        result
    }

    /// Delete the record for a month. Returns whether a row was removed.
    pub async fn delete(&self, key: &ExpenseKey) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_expense_record");

        let result = sqlx::query(
            "DELETE FROM expense_records WHERE region = $1 AND company = $2 AND year = $3 AND month = $4",
        )
        .bind(&key.region)
        .bind(&key.company)
        .bind(key.year)
        .bind(key.month as i32)
        .execute(&self.pool)
        .await;

        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Replace the expenses map of one record.
    pub async fn replace_expenses(
        &self,
        id: uuid::Uuid,
        expenses: &BTreeMap<String, f64>,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("replace_expense_record_expenses");

        let result = sqlx::query(
            "UPDATE expense_records SET expenses = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(Json(expenses))
        .execute(&self.pool)
        .await;

        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}
