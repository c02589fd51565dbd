//! One-off data maintenance used by the `dts-maintenance` binary.

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::task::{ApprovalGate, ApprovalState, Task, TaskFields};
use serde_json::{Map, Value};
use shared::period::MonthYear;
use uuid::Uuid;

/// Document keys mapped onto typed task fields; everything else lands in `extra`.
const KNOWN_KEYS: &[&str] = &[
    "_id", "id", "requestNumber", "requestDate", "date", "status", "serviceRegion", "client",
    "company", "edrpou", "address", "requestDesc", "equipment", "invoice", "workPrice",
    "oilTotal", "filterSum", "fuelFilterSum", "airFilterSum", "antifreezeSum", "otherSum",
    "engineer1", "engineer2", "approvedByWarehouse", "warehouseComment", "approvedByAccountant",
    "accountantComment", "approvedByRegionalManager", "regionalManagerComment",
    "bonusApprovalDate", "createdBy", "autoCreatedAt", "autoCompletedAt", "createdAt",
    "updatedAt", "__v",
];

const DATE_KEYS: &[&str] = &["requestDate", "date"];

const GATE_KEYS: [(&str, ApprovalGate); 3] = [
    ("approvedByWarehouse", ApprovalGate::Warehouse),
    ("approvedByAccountant", ApprovalGate::Accountant),
    ("approvedByRegionalManager", ApprovalGate::RegionalManager),
];

#[derive(Debug, thiserror::Error)]
pub enum LegacyImportError {
    #[error("document is not a JSON object")]
    NotAnObject,

    #[error("invalid task fields: {0}")]
    Fields(#[from] serde_json::Error),
}

/// Converts one exported task document into a task.
///
/// Gate values go through [`ApprovalState::from_legacy`]; unparseable dates and
/// bonus months are dropped rather than failing the document.
pub fn task_from_legacy(document: Value, now: DateTime<Utc>) -> Result<Task, LegacyImportError> {
    let Value::Object(mut doc) = document else {
        return Err(LegacyImportError::NotAnObject);
    };

    for key in DATE_KEYS {
        if let Some(value) = doc.get_mut(*key) {
            *value = lenient_date(value).map_or(Value::Null, |d| Value::String(d.to_string()));
        }
    }
    if doc.get("status").and_then(Value::as_str).map(str::trim) == Some("") {
        doc.remove("status");
    }

    let id = ["id", "_id"]
        .iter()
        .filter_map(|k| doc.get(*k).and_then(Value::as_str))
        .find_map(|raw| Uuid::parse_str(raw.trim()).ok())
        .unwrap_or_else(Uuid::new_v4);

    let gates: Vec<(ApprovalGate, ApprovalState)> = GATE_KEYS
        .iter()
        .map(|(key, gate)| {
            let state = doc.get(*key).map(ApprovalState::from_legacy).unwrap_or_default();
            (*gate, state)
        })
        .collect();

    let bonus_approval_date = doc
        .get("bonusApprovalDate")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<MonthYear>().ok());
    let created_by = string_field(&doc, "createdBy");
    let auto_created_at = timestamp_field(&doc, "autoCreatedAt");
    let auto_completed_at = timestamp_field(&doc, "autoCompletedAt");

    let extra: Map<String, Value> = doc
        .iter()
        .filter(|(k, _)| !KNOWN_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    doc.retain(|k, _| {
        KNOWN_KEYS.contains(&k.as_str()) && !GATE_KEYS.iter().any(|(g, _)| *g == k.as_str())
    });

    let fields: TaskFields = serde_json::from_value(Value::Object(doc))?;

    let mut task = Task::new(id);
    fields.apply_to(&mut task);
    for (gate, state) in gates {
        *task.gate_mut(gate) = state;
    }
    task.bonus_approval_date = bonus_approval_date;
    task.created_by = created_by;
    task.auto_created_at = auto_created_at;
    task.auto_completed_at = auto_completed_at;
    task.extra = Value::Object(extra);
    task.created_at = auto_created_at.unwrap_or(now);
    task.updated_at = now;
    Ok(task)
}

fn lenient_date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn string_field(doc: &Map<String, Value>, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn timestamp_field(doc: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    doc.get(key)
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
