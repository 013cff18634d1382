// models/src/medical/diagnosis.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Ownership};
use crate::errors::{require_text, ValidationResult};
use crate::identifiers::{RecordId, ResourceKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub doctor_id: RecordId,
    pub diagnosis: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Diagnosis {
    pub fn new(patient_id: RecordId, doctor_id: RecordId, diagnosis: &str, date: NaiveDate) -> Self {
        let now = Utc::now();
        Diagnosis {
            id: 0,
            patient_id,
            doctor_id,
            diagnosis: diagnosis.to_string(),
            date,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Diagnosis {
    const KIND: ResourceKind = ResourceKind::Diagnosis;

    entity_timestamps!();

    fn ownership(&self) -> Ownership {
        Ownership::Authored { doctor: self.doctor_id, patient: self.patient_id }
    }

    fn validate(&self) -> ValidationResult<()> {
        require_text("diagnosis", &self.diagnosis)
    }

    fn doctor_reference(&self) -> Option<RecordId> {
        Some(self.doctor_id)
    }
}
