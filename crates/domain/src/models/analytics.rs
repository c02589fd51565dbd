//! Financial analytics domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use super::user::ALL_REGIONS;

// ============================================================================
// Expense Records
// ============================================================================

/// Monthly expenses recorded for one region and company.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: Uuid,
    pub region: String,
    /// Empty when the record is not tied to a company.
    pub company: String,
    pub year: i32,
    pub month: u32,
    /// Category key to amount.
    pub expenses: BTreeMap<String, f64>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unique identity of an expense record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpenseKey {
    pub region: String,
    pub company: String,
    pub year: i32,
    pub month: u32,
}

impl ExpenseKey {
    pub fn new(region: &str, company: Option<&str>, year: i32, month: u32) -> Self {
        Self {
            region: region.trim().to_string(),
            company: company.map(str::trim).unwrap_or_default().to_string(),
            year,
            month,
        }
    }
}

// ============================================================================
// Category Configuration
// ============================================================================

/// One configured expense category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategory {
    #[validate(length(min = 1, max = 50, message = "Category key is required"))]
    pub key: String,
    #[validate(length(min = 1, max = 100, message = "Category label is required"))]
    pub label: String,
    #[validate(length(max = 20))]
    pub color: String,
}

impl ExpenseCategory {
    fn new(key: &str, label: &str, color: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            color: color.to_string(),
        }
    }
}

/// Ordered set of expense categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConfig {
    #[validate(length(min = 1, message = "At least one category is required"))]
    #[validate(nested)]
    pub categories: Vec<ExpenseCategory>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            categories: vec![
                ExpenseCategory::new("salary", "Зарплата", "#FF6384"),
                ExpenseCategory::new("fuel", "Паливо", "#36A2EB"),
                ExpenseCategory::new("transport", "Транспорт", "#FFCE56"),
                ExpenseCategory::new("materials", "Матеріали", "#4BC0C0"),
                ExpenseCategory::new("equipment", "Обладнання", "#9966FF"),
                ExpenseCategory::new("office", "Офісні витрати", "#FF9F40"),
                ExpenseCategory::new("marketing", "Маркетинг", "#FF6384"),
                ExpenseCategory::new("other", "Інші витрати", "#C9CBCF"),
            ],
        }
    }
}

impl CategoryConfig {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.key.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.categories.iter().any(|c| c.key == key)
    }

    /// Keys that appear more than once.
    pub fn duplicate_keys(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut dupes = Vec::new();
        for key in self.keys() {
            if !seen.insert(key) && !dupes.iter().any(|d: &String| d == key) {
                dupes.push(key.to_string());
            }
        }
        dupes
    }
}

// ============================================================================
// Filters and Results
// ============================================================================

/// Region, company and month-range selection for analytics queries.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsFilters {
    pub region: Option<String>,
    pub company: Option<String>,
    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    pub start_year: i32,
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub start_month: u32,
    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    pub end_year: i32,
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub end_month: u32,
}

impl AnalyticsFilters {
    /// Region restriction, if any. Blank and the all-regions wildcard mean none.
    pub fn region_scope(&self) -> Option<&str> {
        self.region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty() && *r != ALL_REGIONS)
    }

    /// Company restriction, if any.
    pub fn company_scope(&self) -> Option<&str> {
        self.company.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// Filters covering a single month.
    pub fn single_month(region: Option<String>, company: Option<String>, year: i32, month: u32) -> Self {
        Self {
            region,
            company,
            start_year: year,
            start_month: month,
            end_year: year,
            end_month: month,
        }
    }
}

/// Query parameters for the detail endpoint.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DetailsQuery {
    pub region: Option<String>,
    pub company: Option<String>,
    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    pub year: i32,
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: u32,
}

impl From<DetailsQuery> for AnalyticsFilters {
    fn from(q: DetailsQuery) -> Self {
        AnalyticsFilters::single_month(q.region, q.company, q.year, q.month)
    }
}

/// Revenue figures, actual and planned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyFigures {
    pub work_revenue: f64,
    pub materials_revenue: f64,
    pub revenue: f64,
    pub planned_work_revenue: f64,
    pub planned_materials_revenue: f64,
    pub planned_revenue: f64,
}

impl MoneyFigures {
    pub fn add_actual(&mut self, work: f64, materials: f64) {
        self.work_revenue += work;
        self.materials_revenue += materials;
        self.revenue = self.work_revenue + self.materials_revenue;
    }

    pub fn add_planned(&mut self, work: f64, materials: f64) {
        self.planned_work_revenue += work;
        self.planned_materials_revenue += materials;
        self.planned_revenue = self.planned_work_revenue + self.planned_materials_revenue;
    }
}

/// Aggregated figures for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRow {
    pub year: i32,
    pub month: u32,
    #[serde(flatten)]
    pub figures: MoneyFigures,
    /// Configured category key to total; every configured key is present.
    pub expenses: BTreeMap<String, f64>,
    pub total_expenses: f64,
    pub profit: f64,
    /// Percent of revenue; 0 when there is no revenue.
    pub profitability: f64,
    pub regional_breakdown: BTreeMap<String, MoneyFigures>,
    /// Tasks contributing actual revenue in this month.
    pub task_count: u32,
}

/// One task's contribution to a month's labor revenue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRow {
    pub task_id: Uuid,
    pub request_number: Option<String>,
    pub date: Option<NaiveDate>,
    pub engineers: Vec<String>,
    pub client: Option<String>,
    pub address: Option<String>,
    pub company: Option<String>,
    pub region: Option<String>,
    pub work_price: f64,
    pub base_bonus: f64,
    pub actual_bonus: f64,
    pub work_revenue: f64,
    pub materials_total: f64,
    pub materials_revenue: f64,
}

/// Bonus totals for one engineer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRating {
    pub engineer: String,
    pub total_bonus: f64,
    pub task_count: u32,
    pub total_work_price: f64,
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Create or replace the expense record for one month.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveExpensesRequest {
    #[validate(length(min = 1, max = 200, message = "Region is required"))]
    pub region: String,
    pub company: Option<String>,
    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    pub year: i32,
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: u32,
    #[serde(default)]
    pub expenses: BTreeMap<String, f64>,
    pub created_by: Option<String>,
}

impl SaveExpensesRequest {
    pub fn key(&self) -> ExpenseKey {
        ExpenseKey::new(&self.region, self.company.as_deref(), self.year, self.month)
    }
}

/// Copy last month's expenses into the given month.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CopyPreviousRequest {
    #[validate(length(min = 1, max = 200, message = "Region is required"))]
    pub region: String,
    pub company: Option<String>,
    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    pub year: i32,
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: u32,
    pub created_by: Option<String>,
}

impl CopyPreviousRequest {
    pub fn key(&self) -> ExpenseKey {
        ExpenseKey::new(&self.region, self.company.as_deref(), self.year, self.month)
    }
}

/// Delete one expense record. `role` is the caller's role.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteExpensesRequest {
    #[validate(length(min = 1, max = 200, message = "Region is required"))]
    pub region: String,
    pub company: Option<String>,
    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    pub year: i32,
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: u32,
    #[serde(default)]
    pub role: String,
}

impl DeleteExpensesRequest {
    pub fn key(&self) -> ExpenseKey {
        ExpenseKey::new(&self.region, self.company.as_deref(), self.year, self.month)
    }
}

/// Result of purging orphaned category keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub records_scanned: u64,
    pub records_changed: u64,
    pub removed_keys: Vec<String>,
}
