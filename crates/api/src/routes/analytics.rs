//! Financial analytics endpoints: expense records, aggregated periods,
//! detail rows and the employee rating.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use domain::models::analytics::{
    AnalyticsFilters, CopyPreviousRequest, DeleteExpensesRequest, DetailRow, DetailsQuery,
    EmployeeRating, ExpenseRecord, PeriodRow, SaveExpensesRequest,
};
use domain::models::user::can_delete_expenses;
use domain::models::Task;
use domain::services::analytics::validate_range;
use domain::services::{
    aggregate, employee_rating, plan_copy_previous, previous_key, revenue_details, CopyPlan,
};
use persistence::repositories::{ExpenseRecordRepository, TaskRepository};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ApiJson;
use crate::routes::expense_categories::load_categories;
use crate::routes::users::SuccessResponse;

async fn load_tasks(state: &AppState, filters: &AnalyticsFilters) -> Result<Vec<Task>, ApiError> {
    let entities = TaskRepository::new(state.pool.clone())
        .list_for_analytics(filters.region_scope(), filters.company_scope())
        .await?;
    Ok(entities.into_iter().map(Task::from).collect())
}

async fn load_records(
    state: &AppState,
    filters: &AnalyticsFilters,
) -> Result<Vec<ExpenseRecord>, ApiError> {
    filters.validate()?;
    let (start, end) = validate_range(filters)?;
    let entities = ExpenseRecordRepository::new(state.pool.clone())
        .list_in_range(filters.region_scope(), filters.company_scope(), start, end)
        .await?;
    Ok(entities.into_iter().map(ExpenseRecord::from).collect())
}

/// Stored expense records in the range.
///
/// GET /api/analytics?region&company&startYear&startMonth&endYear&endMonth
pub async fn list_expenses(
    State(state): State<AppState>,
    Query(filters): Query<AnalyticsFilters>,
) -> Result<Json<Vec<ExpenseRecord>>, ApiError> {
    Ok(Json(load_records(&state, &filters).await?))
}

/// Create or replace the expense record for a month.
///
/// POST /api/analytics
pub async fn save_expenses(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SaveExpensesRequest>,
) -> Result<Json<ExpenseRecord>, ApiError> {
    request.validate()?;
    if request.expenses.values().any(|v| !v.is_finite()) {
        return Err(ApiError::Validation("Expense amounts must be finite numbers".to_string()));
    }

    let key = request.key();
    let entity = ExpenseRecordRepository::new(state.pool.clone())
        .upsert(&key, &request.expenses, request.created_by.as_deref())
        .await?;

    info!(
        region = %key.region,
        company = %key.company,
        year = key.year,
        month = key.month,
        "Expense record saved"
    );
    Ok(Json(entity.into()))
}

/// Delete the expense record for a month. Restricted to administrative roles.
///
/// DELETE /api/analytics
pub async fn delete_expenses(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<DeleteExpensesRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    request.validate()?;
    if !can_delete_expenses(&request.role) {
        return Err(ApiError::Forbidden(
            "Only administrators and regional managers may delete expenses".to_string(),
        ));
    }

    let key = request.key();
    let deleted = ExpenseRecordRepository::new(state.pool.clone())
        .delete(&key)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound("Expense record not found".to_string()));
    }

    info!(
        region = %key.region,
        company = %key.company,
        year = key.year,
        month = key.month,
        role = %request.role,
        "Expense record deleted"
    );
    Ok(Json(SuccessResponse { success: true }))
}

/// Aggregated revenue, expenses and profit per month.
///
/// GET /api/analytics/full
pub async fn full_analytics(
    State(state): State<AppState>,
    Query(filters): Query<AnalyticsFilters>,
) -> Result<Json<Vec<PeriodRow>>, ApiError> {
    let records = load_records(&state, &filters).await?;
    let tasks = load_tasks(&state, &filters).await?;
    let categories = load_categories(&state).await?;

    let rows = aggregate(&tasks, &records, &filters, &categories)?;
    Ok(Json(rows))
}

/// Per-task labor revenue recognized in one month.
///
/// GET /api/analytics/details?year&month&region&company
pub async fn revenue_details_handler(
    State(state): State<AppState>,
    Query(query): Query<DetailsQuery>,
) -> Result<Json<Vec<DetailRow>>, ApiError> {
    query.validate()?;
    let (year, month) = (query.year, query.month);
    let filters = AnalyticsFilters::from(query);
    let tasks = load_tasks(&state, &filters).await?;

    Ok(Json(revenue_details(&tasks, &filters, year, month)?))
}

/// Bonus totals per engineer over the range.
///
/// GET /api/analytics/employee-rating
pub async fn employee_rating_handler(
    State(state): State<AppState>,
    Query(filters): Query<AnalyticsFilters>,
) -> Result<Json<Vec<EmployeeRating>>, ApiError> {
    filters.validate()?;
    let tasks = load_tasks(&state, &filters).await?;
    Ok(Json(employee_rating(&tasks, &filters)?))
}

/// Copy the previous month's expenses into an empty month.
///
/// POST /api/analytics/copy-previous
pub async fn copy_previous(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CopyPreviousRequest>,
) -> Result<(StatusCode, Json<ExpenseRecord>), ApiError> {
    request.validate()?;

    let repo = ExpenseRecordRepository::new(state.pool.clone());
    let key = request.key();
    let target: Option<ExpenseRecord> = repo.find(&key).await?.map(Into::into);
    let previous: Option<ExpenseRecord> = repo.find(&previous_key(&key)).await?.map(Into::into);

    match plan_copy_previous(target.as_ref(), previous.as_ref()) {
        CopyPlan::AlreadyExists => Err(ApiError::Conflict(
            "Expenses for this month already exist".to_string(),
        )),
        CopyPlan::NothingToCopy => Err(ApiError::NotFound(
            "No expenses recorded for the previous month".to_string(),
        )),
        CopyPlan::Create(expenses) => {
            let created = repo
                .insert_if_absent(&key, &expenses, request.created_by.as_deref())
                .await?
                .ok_or_else(|| {
                    ApiError::Conflict("Expenses for this month already exist".to_string())
                })?;

            info!(
                region = %key.region,
                year = key.year,
                month = key.month,
                categories = expenses.len(),
                "Previous month expenses copied"
            );
            Ok((StatusCode::CREATED, Json(created.into())))
        }
    }
}
