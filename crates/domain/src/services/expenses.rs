//! Expense record maintenance: copying the previous month and purging
//! categories that are no longer configured.

use std::collections::BTreeMap;

use crate::models::analytics::{CategoryConfig, ExpenseKey, ExpenseRecord};

/// What a copy-previous request should do.
#[derive(Debug, Clone, PartialEq)]
pub enum CopyPlan {
    /// The target month already has a record; nothing is written.
    AlreadyExists,
    /// The previous month has no record to copy from.
    NothingToCopy,
    /// Create the target record with these expenses.
    Create(BTreeMap<String, f64>),
}

/// Key of the month before `key`, same region and company.
///
/// January maps to December of the previous year.
pub fn previous_key(key: &ExpenseKey) -> ExpenseKey {
    let (year, month) = if key.month <= 1 {
        (key.year - 1, 12)
    } else {
        (key.year, key.month - 1)
    };
    ExpenseKey {
        region: key.region.clone(),
        company: key.company.clone(),
        year,
        month,
    }
}

/// Decides what copying the previous month into the target should do.
pub fn plan_copy_previous(existing_target: Option<&ExpenseRecord>, previous: Option<&ExpenseRecord>) -> CopyPlan {
    match (existing_target, previous) {
        (Some(_), _) => CopyPlan::AlreadyExists,
        (None, None) => CopyPlan::NothingToCopy,
        (None, Some(prev)) => CopyPlan::Create(prev.expenses.clone()),
    }
}

/// Keys in the record that the configuration does not know.
pub fn orphaned_keys(record: &ExpenseRecord, config: &CategoryConfig) -> Vec<String> {
    record
        .expenses
        .keys()
        .filter(|key| !config.contains(key))
        .cloned()
        .collect()
}

/// Removes orphaned keys from the record. Returns the keys removed.
pub fn strip_orphans(record: &mut ExpenseRecord, config: &CategoryConfig) -> Vec<String> {
    let orphans = orphaned_keys(record, config);
    for key in &orphans {
        record.expenses.remove(key);
    }
    orphans
}
