//! Expense record entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Database row mapping for the expense_records table.
#[derive(Debug, Clone, FromRow)]
pub struct ExpenseRecordEntity {
    pub id: Uuid,
    pub region: String,
    pub company: String,
    pub year: i32,
    pub month: i32,
    pub expenses: serde_json::Value,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExpenseRecordEntity {
    /// Convert to domain model.
    ///
    /// Amounts stored as strings are parsed leniently; anything else is dropped.
    pub fn into_domain(self) -> domain::models::ExpenseRecord {
        let mut expenses = BTreeMap::new();
        if let serde_json::Value::Object(map) = self.expenses {
            for (key, value) in map {
                let amount = match &value {
                    serde_json::Value::Number(n) => n.as_f64(),
                    serde_json::Value::String(s) => shared::money::try_parse_amount(s),
                    _ => None,
                };
                if let Some(amount) = amount {
                    expenses.insert(key, amount);
                }
            }
        }

        domain::models::ExpenseRecord {
            id: self.id,
            region: self.region,
            company: self.company,
            year: self.year,
            month: self.month.clamp(1, 12) as u32,
            expenses,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<ExpenseRecordEntity> for domain::models::ExpenseRecord {
    fn from(entity: ExpenseRecordEntity) -> Self {
        entity.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_to_domain_parses_amounts() {
        let entity = ExpenseRecordEntity {
            id: Uuid::new_v4(),
            region: "Київський".to_string(),
            company: String::new(),
            year: 2024,
            month: 3,
            expenses: json!({"fuel": 250.5, "salary": "1 000", "broken": null, "office": "n/a"}),
            created_by: Some("admin".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let record = entity.into_domain();
        assert_eq!(record.month, 3);
        assert_eq!(record.expenses.len(), 2);
        assert_eq!(record.expenses["fuel"], 250.5);
        assert_eq!(record.expenses["salary"], 1000.0);
    }
}
