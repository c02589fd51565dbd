//! Expense category configuration endpoints.

use axum::{extract::State, Json};
use domain::models::analytics::{CategoryConfig, CleanupReport, ExpenseRecord};
use domain::services::strip_orphans;
use persistence::repositories::{ExpenseRecordRepository, ReferenceRepository};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ApiJson;

/// Stored configuration, or the default categories when none is stored.
pub async fn load_categories(state: &AppState) -> Result<CategoryConfig, ApiError> {
    Ok(ReferenceRepository::new(state.pool.clone())
        .get_categories()
        .await?
        .unwrap_or_default())
}

/// GET /api/expense-categories
pub async fn get_categories(State(state): State<AppState>) -> Result<Json<CategoryConfig>, ApiError> {
    Ok(Json(load_categories(&state).await?))
}

/// Replace the category configuration.
///
/// Keys must be unique. Records keep any keys that are no longer configured
/// until the cleanup endpoint is called.
///
/// POST /api/expense-categories
pub async fn save_categories(
    State(state): State<AppState>,
    ApiJson(config): ApiJson<CategoryConfig>,
) -> Result<Json<CategoryConfig>, ApiError> {
    config.validate()?;
    let duplicates = config.duplicate_keys();
    if !duplicates.is_empty() {
        return Err(ApiError::Validation(format!(
            "Duplicate category keys: {}",
            duplicates.join(", ")
        )));
    }

    ReferenceRepository::new(state.pool.clone())
        .save_categories(&config)
        .await?;

    info!(count = config.categories.len(), "Expense categories saved");
    Ok(Json(config))
}

/// Remove keys that are not in the configuration from every stored record.
///
/// POST /api/expense-categories/cleanup
pub async fn cleanup_categories(State(state): State<AppState>) -> Result<Json<CleanupReport>, ApiError> {
    let config = load_categories(&state).await?;
    let repo = ExpenseRecordRepository::new(state.pool.clone());
    let records: Vec<ExpenseRecord> = repo.list_all().await?.into_iter().map(Into::into).collect();

    let mut report = CleanupReport {
        records_scanned: records.len() as u64,
        ..Default::default()
    };
    for mut record in records {
        let removed = strip_orphans(&mut record, &config);
        if removed.is_empty() {
            continue;
        }
        if repo.replace_expenses(record.id, &record.expenses).await? {
            report.records_changed += 1;
        }
        for key in removed {
            if !report.removed_keys.contains(&key) {
                report.removed_keys.push(key);
            }
        }
    }
    report.removed_keys.sort();

    info!(
        scanned = report.records_scanned,
        changed = report.records_changed,
        removed = ?report.removed_keys,
        "Orphaned expense categories removed"
    );
    Ok(Json(report))
}
