//! Task entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::task::{ApprovalState, Materials, TaskStatus};

/// Database row mapping for the tasks table.
///
/// Approval gates are stored as their Ukrainian labels (NULL for pending),
/// the bonus month as `MM-YYYY` text.
#[derive(Debug, Clone, FromRow)]
pub struct TaskEntity {
    pub id: Uuid,
    pub request_number: Option<String>,
    pub request_date: Option<NaiveDate>,
    pub work_date: Option<NaiveDate>,
    pub status: String,
    pub service_region: Option<String>,
    pub client: Option<String>,
    pub company: Option<String>,
    pub edrpou: Option<String>,
    pub address: Option<String>,
    pub request_desc: Option<String>,
    pub equipment: Option<String>,
    pub invoice: Option<String>,
    pub work_price: Option<String>,
    pub oil_total: Option<String>,
    pub filter_sum: Option<String>,
    pub fuel_filter_sum: Option<String>,
    pub air_filter_sum: Option<String>,
    pub antifreeze_sum: Option<String>,
    pub other_sum: Option<String>,
    pub engineer1: Option<String>,
    pub engineer2: Option<String>,
    pub approved_by_warehouse: Option<String>,
    pub warehouse_comment: Option<String>,
    pub approved_by_accountant: Option<String>,
    pub accountant_comment: Option<String>,
    pub approved_by_regional_manager: Option<String>,
    pub regional_manager_comment: Option<String>,
    pub bonus_approval_date: Option<String>,
    pub created_by: Option<String>,
    pub auto_created_at: Option<DateTime<Utc>>,
    pub auto_completed_at: Option<DateTime<Utc>>,
    pub extra: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn gate(label: Option<&str>) -> ApprovalState {
    ApprovalState::from_label(label).unwrap_or(ApprovalState::Pending)
}

impl TaskEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> domain::models::Task {
        let status = self.status.parse::<TaskStatus>().unwrap_or(TaskStatus::Request);
        let bonus_approval_date = self
            .bonus_approval_date
            .as_deref()
            .and_then(|raw| raw.parse().ok());

        domain::models::Task {
            id: self.id,
            request_number: self.request_number,
            request_date: self.request_date,
            work_date: self.work_date,
            status,
            service_region: self.service_region,
            client: self.client,
            company: self.company,
            edrpou: self.edrpou,
            address: self.address,
            request_desc: self.request_desc,
            equipment: self.equipment,
            invoice: self.invoice,
            work_price: self.work_price,
            materials: Materials {
                oil_total: self.oil_total,
                filter_sum: self.filter_sum,
                fuel_filter_sum: self.fuel_filter_sum,
                air_filter_sum: self.air_filter_sum,
                antifreeze_sum: self.antifreeze_sum,
                other_sum: self.other_sum,
            },
            engineer1: self.engineer1,
            engineer2: self.engineer2,
            approved_by_warehouse: gate(self.approved_by_warehouse.as_deref()),
            warehouse_comment: self.warehouse_comment,
            approved_by_accountant: gate(self.approved_by_accountant.as_deref()),
            accountant_comment: self.accountant_comment,
            approved_by_regional_manager: gate(self.approved_by_regional_manager.as_deref()),
            regional_manager_comment: self.regional_manager_comment,
            bonus_approval_date,
            created_by: self.created_by,
            auto_created_at: self.auto_created_at,
            auto_completed_at: self.auto_completed_at,
            extra: self.extra,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<TaskEntity> for domain::models::Task {
    fn from(entity: TaskEntity) -> Self {
        entity.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entity() -> TaskEntity {
        TaskEntity {
            id: Uuid::new_v4(),
            request_number: Some("KV-1".to_string()),
            request_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            work_date: NaiveDate::from_ymd_opt(2024, 3, 5),
            status: "Виконано".to_string(),
            service_region: Some("Київський".to_string()),
            client: None,
            company: None,
            edrpou: None,
            address: None,
            request_desc: None,
            equipment: None,
            invoice: None,
            work_price: Some("1000".to_string()),
            oil_total: Some("200".to_string()),
            filter_sum: None,
            fuel_filter_sum: None,
            air_filter_sum: None,
            antifreeze_sum: None,
            other_sum: None,
            engineer1: Some("Петренко".to_string()),
            engineer2: None,
            approved_by_warehouse: Some("Підтверджено".to_string()),
            warehouse_comment: None,
            approved_by_accountant: Some("Відмова".to_string()),
            accountant_comment: Some("Немає акту".to_string()),
            approved_by_regional_manager: None,
            regional_manager_comment: None,
            bonus_approval_date: Some("03-2024".to_string()),
            created_by: None,
            auto_created_at: None,
            auto_completed_at: None,
            extra: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_entity_to_domain() {
        let entity = create_test_entity();
        let task: domain::models::Task = entity.clone().into();

        assert_eq!(task.id, entity.id);
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.approved_by_warehouse, ApprovalState::Approved);
        assert_eq!(task.approved_by_accountant, ApprovalState::Rejected);
        assert_eq!(task.approved_by_regional_manager, ApprovalState::Pending);
        assert_eq!(task.bonus_approval_date.unwrap().to_string(), "03-2024");
        assert_eq!(task.materials.total(), 200.0);
    }

    #[test]
    fn test_unknown_values_fall_back() {
        let mut entity = create_test_entity();
        entity.status = "???".to_string();
        entity.approved_by_warehouse = Some("true".to_string());
        entity.bonus_approval_date = Some("2024-03".to_string());

        let task = entity.into_domain();
        assert_eq!(task.status, TaskStatus::Request);
        assert_eq!(task.approved_by_warehouse, ApprovalState::Pending);
        assert!(task.bonus_approval_date.is_none());
    }
}
