// models/src/medical/nutrition.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Ownership};
use crate::errors::{require_text, ValidationError, ValidationResult};
use crate::identifiers::{RecordId, ResourceKind};

/// A diet plan for a patient. `doctor_id` is empty when the plan came from
/// the automated generator rather than a doctor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionalPlan {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub doctor_id: Option<RecordId>,
    pub plan_details: String, // JSON text
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub goals: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NutritionalPlan {
    pub fn new(patient_id: RecordId, plan_details: &str, start_date: NaiveDate) -> Self {
        let now = Utc::now();
        NutritionalPlan {
            id: 0,
            patient_id,
            doctor_id: None,
            plan_details: plan_details.to_string(),
            start_date,
            end_date: None,
            goals: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Parsed plan body; plain text plans come back as a JSON string.
    pub fn details_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.plan_details)
            .unwrap_or_else(|_| serde_json::Value::String(self.plan_details.clone()))
    }
}

impl Entity for NutritionalPlan {
    const KIND: ResourceKind = ResourceKind::NutritionalPlan;

    entity_timestamps!();

    fn ownership(&self) -> Ownership {
        Ownership::Account(self.patient_id)
    }

    fn validate(&self) -> ValidationResult<()> {
        require_text("plan_details", &self.plan_details)?;
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(ValidationError::InvalidDateRange {
                    start_field: "start_date".to_string(),
                    field: "end_date".to_string(),
                });
            }
        }
        Ok(())
    }

    fn doctor_reference(&self) -> Option<RecordId> {
        self.doctor_id
    }

    fn protected_fields() -> &'static [&'static str] {
        &["id", "patient_id", "created_at", "updated_at"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_fall_back_to_plain_text() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let json_plan = NutritionalPlan::new(1, r#"{"breakfast":"oats"}"#, start);
        assert_eq!(json_plan.details_json()["breakfast"], "oats");
        let text_plan = NutritionalPlan::new(1, "more greens", start);
        assert_eq!(text_plan.details_json(), serde_json::Value::String("more greens".to_string()));
    }
}
