//! Financial analytics: revenue recognition, expenses and employee bonuses.
//!
//! All functions are pure over borrowed inputs; the same inputs always
//! produce the same output.

use shared::period::MonthYear;
use shared::validation::{validate_month, validate_year};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

use crate::models::analytics::{
    AnalyticsFilters, CategoryConfig, DetailRow, EmployeeRating, ExpenseRecord, MoneyFigures,
    PeriodRow,
};
use crate::models::task::{Task, TaskStatus};

/// Share of the work price paid to engineers as a bonus.
pub const BONUS_RATE: f64 = 0.25;

/// Work revenue recognized per unit of bonus.
pub const REVENUE_MULTIPLIER: f64 = 3.0;

/// Materials revenue is this fraction of the materials total.
pub const MATERIALS_DIVISOR: f64 = 4.0;

/// Longest range a single query may cover.
pub const MAX_RANGE_MONTHS: u32 = 120;

/// Regional breakdown key for tasks without a region.
const UNKNOWN_REGION: &str = "Н/Д";

/// Error type for analytics queries.
#[derive(Debug, Error, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("Range of {0} months exceeds the maximum of 120")]
    RangeTooLong(u32),
}

/// Validates the filter range and returns its first and last month.
pub fn validate_range(
    filters: &AnalyticsFilters,
) -> Result<(MonthYear, MonthYear), AnalyticsError> {
    for month in [filters.start_month, filters.end_month] {
        validate_month(month).map_err(|e| AnalyticsError::InvalidRange(message_of(&e)))?;
    }
    for year in [filters.start_year, filters.end_year] {
        validate_year(year).map_err(|e| AnalyticsError::InvalidRange(message_of(&e)))?;
    }

    let start = MonthYear::new(filters.start_year, filters.start_month)
        .map_err(|e| AnalyticsError::InvalidRange(e.to_string()))?;
    let end = MonthYear::new(filters.end_year, filters.end_month)
        .map_err(|e| AnalyticsError::InvalidRange(e.to_string()))?;

    if start > end {
        return Err(AnalyticsError::InvalidRange(format!(
            "start {} is after end {}",
            start, end
        )));
    }
    let months = start.months_until(end);
    if months > MAX_RANGE_MONTHS {
        return Err(AnalyticsError::RangeTooLong(months));
    }
    Ok((start, end))
}

fn message_of(err: &validator::ValidationError) -> String {
    err.message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| err.code.to_string())
}

// ============================================================================
// Filtering
// ============================================================================

/// Region filter value, or `None` when every region is selected.
fn region_selection(filters: &AnalyticsFilters) -> Option<String> {
    filters.region_scope().map(str::to_lowercase)
}

fn company_selection(filters: &AnalyticsFilters) -> Option<&str> {
    filters.company_scope()
}

fn region_matches(selection: Option<&str>, region: Option<&str>) -> bool {
    match selection {
        None => true,
        Some(wanted) => region.map(|r| r.trim().to_lowercase()).as_deref() == Some(wanted),
    }
}

fn company_matches(selection: Option<&str>, company: Option<&str>) -> bool {
    match selection {
        None => true,
        Some(wanted) => company.map(str::trim) == Some(wanted),
    }
}

fn task_selected(task: &Task, region: Option<&str>, company: Option<&str>) -> bool {
    region_matches(region, task.service_region.as_deref())
        && company_matches(company, task.company.as_deref())
}

// ============================================================================
// Revenue recognition
// ============================================================================

/// Base bonus for a task: work price times [`BONUS_RATE`].
pub fn base_bonus(task: &Task) -> f64 {
    task.work_price_value() * BONUS_RATE
}

/// Work revenue recognized for a task.
///
/// The bonus is shared between engineers rather than paid per engineer, so
/// the task contributes the same amount whether one, two or no engineers
/// are named.
pub fn work_revenue(task: &Task) -> f64 {
    base_bonus(task) * REVENUE_MULTIPLIER
}

/// Materials revenue recognized for a task.
pub fn materials_revenue(task: &Task) -> f64 {
    task.materials.total() / MATERIALS_DIVISOR
}

fn labor_period(task: &Task) -> Option<MonthYear> {
    task.bonus_approval_date
}

fn materials_period(task: &Task) -> Option<MonthYear> {
    if task.status == TaskStatus::Done {
        task.work_date.map(MonthYear::from_date)
    } else {
        None
    }
}

fn planned_period(task: &Task) -> Option<MonthYear> {
    match task.status {
        TaskStatus::Done | TaskStatus::Blocked => None,
        _ => task.effective_date().map(MonthYear::from_date),
    }
}

fn region_key(task: &Task) -> String {
    task.service_region
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(UNKNOWN_REGION)
        .to_string()
}

#[derive(Default)]
struct Bucket {
    figures: MoneyFigures,
    regions: BTreeMap<String, MoneyFigures>,
    contributing: HashSet<uuid::Uuid>,
}

/// Aggregates revenue and expenses per month over the filter range.
///
/// Returns one row per month in the range, in chronological order.
pub fn aggregate(
    tasks: &[Task],
    records: &[ExpenseRecord],
    filters: &AnalyticsFilters,
    categories: &CategoryConfig,
) -> Result<Vec<PeriodRow>, AnalyticsError> {
    let (start, end) = validate_range(filters)?;
    let region = region_selection(filters);
    let company = company_selection(filters);
    let in_range = |p: MonthYear| p >= start && p <= end;

    let mut buckets: HashMap<MonthYear, Bucket> = HashMap::new();

    for task in tasks
        .iter()
        .filter(|t| task_selected(t, region.as_deref(), company))
    {
        if let Some(period) = labor_period(task).filter(|p| in_range(*p)) {
            let work = work_revenue(task);
            let bucket = buckets.entry(period).or_default();
            bucket.figures.add_actual(work, 0.0);
            bucket.regions.entry(region_key(task)).or_default().add_actual(work, 0.0);
            bucket.contributing.insert(task.id);
        }

        if let Some(period) = materials_period(task).filter(|p| in_range(*p)) {
            let materials = materials_revenue(task);
            let bucket = buckets.entry(period).or_default();
            bucket.figures.add_actual(0.0, materials);
            bucket.regions.entry(region_key(task)).or_default().add_actual(0.0, materials);
            bucket.contributing.insert(task.id);
        }

        if let Some(period) = planned_period(task).filter(|p| in_range(*p)) {
            let (work, materials) = (work_revenue(task), materials_revenue(task));
            let bucket = buckets.entry(period).or_default();
            bucket.figures.add_planned(work, materials);
            bucket.regions.entry(region_key(task)).or_default().add_planned(work, materials);
        }
    }

    let mut expenses: HashMap<MonthYear, BTreeMap<String, f64>> = HashMap::new();
    for record in records.iter().filter(|r| {
        region_matches(region.as_deref(), Some(r.region.as_str()))
            && company_matches(company, Some(r.company.as_str()))
    }) {
        let Ok(period) = MonthYear::new(record.year, record.month) else {
            continue;
        };
        if !in_range(period) {
            continue;
        }
        let totals = expenses.entry(period).or_default();
        for (key, amount) in &record.expenses {
            if categories.contains(key) && amount.is_finite() {
                *totals.entry(key.clone()).or_insert(0.0) += amount;
            }
        }
    }

    let rows = MonthYear::range_inclusive(start, end)
        .into_iter()
        .map(|period| {
            let bucket = buckets.remove(&period).unwrap_or_default();
            let month_expenses = expenses.remove(&period).unwrap_or_default();
            let expenses: BTreeMap<String, f64> = categories
                .keys()
                .map(|key| (key.to_string(), month_expenses.get(key).copied().unwrap_or(0.0)))
                .collect();
            let total_expenses: f64 = expenses.values().sum();
            let profit = bucket.figures.revenue - total_expenses;
            let profitability = if bucket.figures.revenue != 0.0 {
                profit / bucket.figures.revenue * 100.0
            } else {
                0.0
            };

            PeriodRow {
                year: period.year,
                month: period.month,
                figures: bucket.figures,
                expenses,
                total_expenses,
                profit,
                profitability,
                regional_breakdown: bucket.regions,
                task_count: bucket.contributing.len() as u32,
            }
        })
        .collect();

    Ok(rows)
}

/// Per-task breakdown of the labor revenue recognized in one month.
pub fn revenue_details(
    tasks: &[Task],
    filters: &AnalyticsFilters,
    year: i32,
    month: u32,
) -> Result<Vec<DetailRow>, AnalyticsError> {
    let single = AnalyticsFilters::single_month(None, None, year, month);
    let (period, _) = validate_range(&single)?;
    let region = region_selection(filters);
    let company = company_selection(filters);

    Ok(tasks
        .iter()
        .filter(|t| task_selected(t, region.as_deref(), company))
        .filter(|t| labor_period(t) == Some(period))
        .map(|task| {
            let base = base_bonus(task);
            let materials_total = task.materials.total();
            DetailRow {
                task_id: task.id,
                request_number: task.request_number.clone(),
                date: task.work_date,
                engineers: task.engineers().into_iter().map(str::to_string).collect(),
                client: task.client.clone(),
                address: task.address.clone(),
                company: task.company.clone(),
                region: task.service_region.clone(),
                work_price: task.work_price_value(),
                base_bonus: base,
                actual_bonus: base,
                work_revenue: base * REVENUE_MULTIPLIER,
                materials_total,
                materials_revenue: materials_total / MATERIALS_DIVISOR,
            }
        })
        .collect())
}

/// Bonus totals per engineer over the filter range, highest first.
///
/// Each engineer on a task receives the base bonus divided by the number
/// of engineers on it.
pub fn employee_rating(
    tasks: &[Task],
    filters: &AnalyticsFilters,
) -> Result<Vec<EmployeeRating>, AnalyticsError> {
    let (start, end) = validate_range(filters)?;
    let region = region_selection(filters);
    let company = company_selection(filters);

    let mut by_engineer: HashMap<String, EmployeeRating> = HashMap::new();
    for task in tasks
        .iter()
        .filter(|t| task_selected(t, region.as_deref(), company))
        .filter(|t| labor_period(t).is_some_and(|p| p >= start && p <= end))
    {
        let engineers = task.engineers();
        if engineers.is_empty() {
            continue;
        }
        let share = base_bonus(task) / engineers.len() as f64;
        let work_price = task.work_price_value();
        for engineer in engineers {
            let entry = by_engineer
                .entry(engineer.to_string())
                .or_insert_with(|| EmployeeRating {
                    engineer: engineer.to_string(),
                    total_bonus: 0.0,
                    task_count: 0,
                    total_work_price: 0.0,
                });
            entry.total_bonus += share;
            entry.task_count += 1;
            entry.total_work_price += work_price;
        }
    }

    let mut ratings: Vec<EmployeeRating> = by_engineer.into_values().collect();
    ratings.sort_by(|a, b| {
        b.total_bonus
            .total_cmp(&a.total_bonus)
            .then_with(|| a.engineer.cmp(&b.engineer))
    });
    Ok(ratings)
}
