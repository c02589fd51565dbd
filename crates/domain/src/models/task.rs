//! Service task (work order) domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shared::money::{deserialize_amount, is_present, parse_amount};
use shared::period::MonthYear;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Task Status
// ============================================================================

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    /// Request registered, nobody assigned yet.
    #[default]
    Request,
    InProgress,
    Done,
    Blocked,
}

impl TaskStatus {
    /// Returns the string representation used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Request => "Заявка",
            TaskStatus::InProgress => "В роботі",
            TaskStatus::Done => "Виконано",
            TaskStatus::Blocked => "Заблоковано",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Заявка" => Ok(TaskStatus::Request),
            "В роботі" => Ok(TaskStatus::InProgress),
            "Виконано" => Ok(TaskStatus::Done),
            "Заблоковано" => Ok(TaskStatus::Blocked),
            other => Err(format!(
                "Invalid task status: {}. Must be one of: Заявка, В роботі, Виконано, Заблоковано",
                other
            )),
        }
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Approval State
// ============================================================================

/// State of one approval gate (warehouse, accountant, regional manager).
///
/// Canonical JSON form is `null` for `Pending` and the Ukrainian labels for
/// the other states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApprovalState {
    #[default]
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl ApprovalState {
    const UNDER_REVIEW: &'static str = "На розгляді";
    const APPROVED: &'static str = "Підтверджено";
    const REJECTED: &'static str = "Відмова";

    /// Storage label; `None` for `Pending`.
    pub fn as_label(&self) -> Option<&'static str> {
        match self {
            ApprovalState::Pending => None,
            ApprovalState::UnderReview => Some(Self::UNDER_REVIEW),
            ApprovalState::Approved => Some(Self::APPROVED),
            ApprovalState::Rejected => Some(Self::REJECTED),
        }
    }

    /// Parses the canonical storage label.
    pub fn from_label(label: Option<&str>) -> Result<Self, String> {
        match label.map(str::trim) {
            None | Some("") => Ok(ApprovalState::Pending),
            Some(Self::UNDER_REVIEW) => Ok(ApprovalState::UnderReview),
            Some(Self::APPROVED) => Ok(ApprovalState::Approved),
            Some(Self::REJECTED) => Ok(ApprovalState::Rejected),
            Some(other) => Err(format!("Invalid approval state: {}", other)),
        }
    }

    /// Maps the mixed boolean/string values found in old task documents.
    ///
    /// Only the legacy import uses this; request handling accepts the
    /// canonical form alone.
    pub fn from_legacy(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Bool(true) => ApprovalState::Approved,
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "підтверджено" | "approved" | "true" => ApprovalState::Approved,
                "відмова" | "rejected" => ApprovalState::Rejected,
                "на розгляді" | "review" | "under_review" => ApprovalState::UnderReview,
                _ => ApprovalState::Pending,
            },
            _ => ApprovalState::Pending,
        }
    }

    /// Whether the gate can move from `self` to `target`.
    ///
    /// Approved and Rejected are terminal; re-applying the current state is allowed.
    pub fn can_transition_to(&self, target: ApprovalState) -> bool {
        if *self == target {
            return true;
        }
        match (self, target) {
            (ApprovalState::Pending, ApprovalState::UnderReview) => true,
            (ApprovalState::Pending, ApprovalState::Approved) => true,
            (ApprovalState::Pending, ApprovalState::Rejected) => true,
            (ApprovalState::UnderReview, ApprovalState::Approved) => true,
            (ApprovalState::UnderReview, ApprovalState::Rejected) => true,
            _ => false,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalState::Approved)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ApprovalState::Rejected)
    }
}

impl fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_label().unwrap_or("null"))
    }
}

impl Serialize for ApprovalState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_label() {
            Some(label) => serializer.serialize_str(label),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for ApprovalState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        ApprovalState::from_label(raw.as_deref()).map_err(serde::de::Error::custom)
    }
}

/// Which of the three approval gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApprovalGate {
    Warehouse,
    Accountant,
    RegionalManager,
}

impl fmt::Display for ApprovalGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalGate::Warehouse => write!(f, "warehouse"),
            ApprovalGate::Accountant => write!(f, "accountant"),
            ApprovalGate::RegionalManager => write!(f, "regionalManager"),
        }
    }
}

// ============================================================================
// Materials
// ============================================================================

/// Material cost subtotals, stored as entered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Materials {
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub oil_total: Option<String>,
    /// Oil filter subtotal.
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub filter_sum: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub fuel_filter_sum: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub air_filter_sum: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub antifreeze_sum: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub other_sum: Option<String>,
}

impl Materials {
    /// Oil, fuel and air filter subtotals combined.
    pub fn filters_total(&self) -> f64 {
        parse_amount(self.filter_sum.as_deref())
            + parse_amount(self.fuel_filter_sum.as_deref())
            + parse_amount(self.air_filter_sum.as_deref())
    }

    /// oilTotal + filters + antifreeze + other.
    pub fn total(&self) -> f64 {
        parse_amount(self.oil_total.as_deref())
            + self.filters_total()
            + parse_amount(self.antifreeze_sum.as_deref())
            + parse_amount(self.other_sum.as_deref())
    }
}

// ============================================================================
// Core Model
// ============================================================================

/// A service request / work order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub request_number: Option<String>,
    pub request_date: Option<NaiveDate>,
    /// Date the work was performed.
    #[serde(rename = "date")]
    pub work_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub service_region: Option<String>,
    pub client: Option<String>,
    pub company: Option<String>,
    pub edrpou: Option<String>,
    pub address: Option<String>,
    pub request_desc: Option<String>,
    pub equipment: Option<String>,
    pub invoice: Option<String>,
    pub work_price: Option<String>,
    #[serde(flatten)]
    pub materials: Materials,
    pub engineer1: Option<String>,
    pub engineer2: Option<String>,
    pub approved_by_warehouse: ApprovalState,
    pub warehouse_comment: Option<String>,
    pub approved_by_accountant: ApprovalState,
    pub accountant_comment: Option<String>,
    pub approved_by_regional_manager: ApprovalState,
    pub regional_manager_comment: Option<String>,
    pub bonus_approval_date: Option<MonthYear>,
    pub created_by: Option<String>,
    pub auto_created_at: Option<DateTime<Utc>>,
    pub auto_completed_at: Option<DateTime<Utc>>,
    /// Any additional document fields, kept verbatim.
    #[serde(default)]
    pub extra: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// A blank task with the given id, used as a starting point by builders and tests.
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            request_number: None,
            request_date: None,
            work_date: None,
            status: TaskStatus::Request,
            service_region: None,
            client: None,
            company: None,
            edrpou: None,
            address: None,
            request_desc: None,
            equipment: None,
            invoice: None,
            work_price: None,
            materials: Materials::default(),
            engineer1: None,
            engineer2: None,
            approved_by_warehouse: ApprovalState::Pending,
            warehouse_comment: None,
            approved_by_accountant: ApprovalState::Pending,
            accountant_comment: None,
            approved_by_regional_manager: ApprovalState::Pending,
            regional_manager_comment: None,
            bonus_approval_date: None,
            created_by: None,
            auto_created_at: None,
            auto_completed_at: None,
            extra: serde_json::Value::Object(Default::default()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Parsed work price (0 when absent or malformed).
    pub fn work_price_value(&self) -> f64 {
        parse_amount(self.work_price.as_deref())
    }

    /// Whether a work price was entered at all.
    pub fn has_work_price(&self) -> bool {
        is_present(self.work_price.as_deref())
    }

    /// Assigned engineers, trimmed, blanks removed.
    pub fn engineers(&self) -> Vec<&str> {
        [self.engineer1.as_deref(), self.engineer2.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .collect()
    }

    /// State of the given gate.
    pub fn gate(&self, gate: ApprovalGate) -> ApprovalState {
        match gate {
            ApprovalGate::Warehouse => self.approved_by_warehouse,
            ApprovalGate::Accountant => self.approved_by_accountant,
            ApprovalGate::RegionalManager => self.approved_by_regional_manager,
        }
    }

    /// Mutable access to the given gate.
    pub fn gate_mut(&mut self, gate: ApprovalGate) -> &mut ApprovalState {
        match gate {
            ApprovalGate::Warehouse => &mut self.approved_by_warehouse,
            ApprovalGate::Accountant => &mut self.approved_by_accountant,
            ApprovalGate::RegionalManager => &mut self.approved_by_regional_manager,
        }
    }

    /// Work date, falling back to the request date.
    pub fn effective_date(&self) -> Option<NaiveDate> {
        self.work_date.or(self.request_date)
    }
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Editable task fields shared by create and update requests.
///
/// Every field is optional; on update only the supplied fields change.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskFields {
    #[validate(length(max = 100, message = "Request number must be at most 100 characters"))]
    pub request_number: Option<String>,
    pub request_date: Option<NaiveDate>,
    #[serde(rename = "date")]
    pub work_date: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
    #[validate(length(max = 200, message = "Service region must be at most 200 characters"))]
    pub service_region: Option<String>,
    pub client: Option<String>,
    pub company: Option<String>,
    pub edrpou: Option<String>,
    pub address: Option<String>,
    pub request_desc: Option<String>,
    pub equipment: Option<String>,
    pub invoice: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub work_price: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub oil_total: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub filter_sum: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub fuel_filter_sum: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub air_filter_sum: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub antifreeze_sum: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub other_sum: Option<String>,
    pub engineer1: Option<String>,
    pub engineer2: Option<String>,
    pub warehouse_comment: Option<String>,
    pub accountant_comment: Option<String>,
    pub regional_manager_comment: Option<String>,
    pub extra: Option<serde_json::Value>,
}

impl TaskFields {
    /// Copies every supplied field onto the task.
    pub fn apply_to(self, task: &mut Task) {
        macro_rules! set {
            ($($field:ident).+ <- $value:expr) => {
                if let Some(v) = $value {
                    task.$($field).+ = Some(v);
                }
            };
        }

        set!(request_number <- self.request_number);
        set!(request_date <- self.request_date);
        set!(work_date <- self.work_date);
        if let Some(status) = self.status {
            task.status = status;
        }
        set!(service_region <- self.service_region);
        set!(client <- self.client);
        set!(company <- self.company);
        set!(edrpou <- self.edrpou);
        set!(address <- self.address);
        set!(request_desc <- self.request_desc);
        set!(equipment <- self.equipment);
        set!(invoice <- self.invoice);
        set!(work_price <- self.work_price);
        set!(materials.oil_total <- self.oil_total);
        set!(materials.filter_sum <- self.filter_sum);
        set!(materials.fuel_filter_sum <- self.fuel_filter_sum);
        set!(materials.air_filter_sum <- self.air_filter_sum);
        set!(materials.antifreeze_sum <- self.antifreeze_sum);
        set!(materials.other_sum <- self.other_sum);
        set!(engineer1 <- self.engineer1);
        set!(engineer2 <- self.engineer2);
        set!(warehouse_comment <- self.warehouse_comment);
        set!(accountant_comment <- self.accountant_comment);
        set!(regional_manager_comment <- self.regional_manager_comment);
        if let Some(extra) = self.extra {
            merge_extra(&mut task.extra, extra);
        }
    }
}

/// Shallow-merges object keys of `incoming` into `target`.
fn merge_extra(target: &mut serde_json::Value, incoming: serde_json::Value) {
    use serde_json::Value;
    match (target, incoming) {
        (Value::Object(dst), Value::Object(src)) => {
            for (k, v) in src {
                dst.insert(k, v);
            }
        }
        (dst, src) => *dst = src,
    }
}

/// Request payload for creating a task.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub fields: TaskFields,
    /// Login of the user creating the task; excluded from the notification.
    pub author_login: Option<String>,
}

/// Request payload for updating a task.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub fields: TaskFields,
    /// `Some(None)` is not distinguishable from absent here; gates only move forward.
    pub approved_by_warehouse: Option<ApprovalState>,
    pub approved_by_accountant: Option<ApprovalState>,
    pub approved_by_regional_manager: Option<ApprovalState>,
    pub author_login: Option<String>,
}

/// Query parameters for listing tasks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    /// Region filter; `Україна` or a value containing `Загальний` means all,
    /// a comma-separated list means any of.
    pub region: Option<String>,
    pub status: Option<TaskStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Region filter derived from a list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionFilter {
    All,
    AnyOf(Vec<String>),
}

impl ListTasksQuery {
    /// Interprets the region parameter.
    pub fn region_filter(&self) -> RegionFilter {
        match self.region.as_deref().map(str::trim) {
            None | Some("") => RegionFilter::All,
            Some(r) if r == crate::models::user::ALL_REGIONS || r.contains("Загальний") => {
                RegionFilter::All
            }
            Some(r) => RegionFilter::AnyOf(
                r.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_status_roundtrip() {
        for status in [
            TaskStatus::Request,
            TaskStatus::InProgress,
            TaskStatus::Done,
            TaskStatus::Blocked,
        ] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert!("Done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_approval_state_json_forms() {
        assert_eq!(serde_json::to_value(ApprovalState::Pending).unwrap(), json!(null));
        assert_eq!(
            serde_json::to_value(ApprovalState::Approved).unwrap(),
            json!("Підтверджено")
        );
        let s: ApprovalState = serde_json::from_value(json!("Відмова")).unwrap();
        assert_eq!(s, ApprovalState::Rejected);
        let s: ApprovalState = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(s, ApprovalState::Pending);
    }

    #[test]
    fn test_approval_state_rejects_legacy_booleans_on_the_wire() {
        assert!(serde_json::from_value::<ApprovalState>(json!(true)).is_err());
        assert!(serde_json::from_value::<ApprovalState>(json!("approved")).is_err());
    }

    #[test]
    fn test_approval_state_from_legacy() {
        assert_eq!(ApprovalState::from_legacy(&json!(true)), ApprovalState::Approved);
        assert_eq!(ApprovalState::from_legacy(&json!(false)), ApprovalState::Pending);
        assert_eq!(
            ApprovalState::from_legacy(&json!("Підтверджено")),
            ApprovalState::Approved
        );
        assert_eq!(
            ApprovalState::from_legacy(&json!("Відмова")),
            ApprovalState::Rejected
        );
        assert_eq!(
            ApprovalState::from_legacy(&json!("На розгляді")),
            ApprovalState::UnderReview
        );
        assert_eq!(ApprovalState::from_legacy(&json!(null)), ApprovalState::Pending);
    }

    #[test]
    fn test_approval_transitions() {
        use ApprovalState::*;
        assert!(Pending.can_transition_to(UnderReview));
        assert!(Pending.can_transition_to(Approved));
        assert!(UnderReview.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Rejected.can_transition_to(Pending));
        assert!(!UnderReview.can_transition_to(Pending));
    }

    #[test]
    fn test_materials_total() {
        let m = Materials {
            oil_total: Some("400".into()),
            filter_sum: Some("100".into()),
            fuel_filter_sum: Some("60".into()),
            air_filter_sum: Some("40".into()),
            antifreeze_sum: None,
            other_sum: Some("".into()),
        };
        assert_eq!(m.filters_total(), 200.0);
        assert_eq!(m.total(), 600.0);
    }

    #[test]
    fn test_engineers_skips_blank() {
        let mut task = Task::new(Uuid::nil());
        task.engineer1 = Some(" Петренко ".into());
        task.engineer2 = Some("  ".into());
        assert_eq!(task.engineers(), vec!["Петренко"]);
    }

    #[test]
    fn test_task_serializes_with_wire_names() {
        let mut task = Task::new(Uuid::nil());
        task.work_date = NaiveDate::from_ymd_opt(2024, 3, 5);
        task.materials.oil_total = Some("10".into());
        task.bonus_approval_date = Some(MonthYear::new(2024, 3).unwrap());
        let v = serde_json::to_value(&task).unwrap();
        assert_eq!(v["date"], json!("2024-03-05"));
        assert_eq!(v["oilTotal"], json!("10"));
        assert_eq!(v["status"], json!("Заявка"));
        assert_eq!(v["bonusApprovalDate"], json!("03-2024"));
        assert_eq!(v["approvedByWarehouse"], json!(null));
    }

    #[test]
    fn test_task_fields_apply_only_supplied() {
        let mut task = Task::new(Uuid::nil());
        task.client = Some("Old".into());
        task.service_region = Some("Київський".into());

        let fields: TaskFields = serde_json::from_value(json!({
            "client": "New",
            "workPrice": 1200,
            "status": "В роботі",
            "extra": {"paymentType": "Безготівка"}
        }))
        .unwrap();
        fields.apply_to(&mut task);

        assert_eq!(task.client.as_deref(), Some("New"));
        assert_eq!(task.service_region.as_deref(), Some("Київський"));
        assert_eq!(task.work_price.as_deref(), Some("1200"));
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.extra["paymentType"], json!("Безготівка"));
    }

    #[test]
    fn test_region_filter() {
        let q = ListTasksQuery {
            region: Some("Україна".into()),
            ..Default::default()
        };
        assert_eq!(q.region_filter(), RegionFilter::All);

        let q = ListTasksQuery {
            region: Some("Загальний (всі)".into()),
            ..Default::default()
        };
        assert_eq!(q.region_filter(), RegionFilter::All);

        let q = ListTasksQuery {
            region: Some("Київський, Одеський".into()),
            ..Default::default()
        };
        assert_eq!(
            q.region_filter(),
            RegionFilter::AnyOf(vec!["Київський".into(), "Одеський".into()])
        );
    }
}
