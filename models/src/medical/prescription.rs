// models/src/medical/prescription.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Ownership};
use crate::errors::{require_text, ValidationError, ValidationResult};
use crate::identifiers::{RecordId, ResourceKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub doctor_id: RecordId,
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prescription {
    pub fn new(
        patient_id: RecordId,
        doctor_id: RecordId,
        medication: &str,
        dosage: &str,
        frequency: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Prescription {
            id: 0,
            patient_id,
            doctor_id,
            medication: medication.to_string(),
            dosage: dosage.to_string(),
            frequency: frequency.to_string(),
            start_date,
            end_date,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the course of medication covers `day`.
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

impl Entity for Prescription {
    const KIND: ResourceKind = ResourceKind::Prescription;

    entity_timestamps!();

    fn ownership(&self) -> Ownership {
        Ownership::Authored { doctor: self.doctor_id, patient: self.patient_id }
    }

    fn validate(&self) -> ValidationResult<()> {
        require_text("medication", &self.medication)?;
        require_text("dosage", &self.dosage)?;
        require_text("frequency", &self.frequency)?;
        if self.end_date < self.start_date {
            return Err(ValidationError::InvalidDateRange {
                start_field: "start_date".to_string(),
                field: "end_date".to_string(),
            });
        }
        Ok(())
    }

    fn doctor_reference(&self) -> Option<RecordId> {
        Some(self.doctor_id)
    }
}
