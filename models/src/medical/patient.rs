// models/src/medical/patient.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Ownership};
use crate::errors::{require_text, ValidationError, ValidationResult};
use crate::identifiers::{RecordId, ResourceKind};

/// Clinical patient record kept by doctors. It may be linked to the
/// patient's own account, in which case that account owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: RecordId,
    pub account_id: Option<RecordId>, // Links to an existing Account (if the patient has one)
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub medical_history: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PatientRecord {
    pub fn new(name: &str, date_of_birth: NaiveDate, email: &str) -> Self {
        let now = Utc::now();
        PatientRecord {
            id: 0,
            account_id: None,
            name: name.to_string(),
            date_of_birth,
            email: email.to_string(),
            medical_history: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for PatientRecord {
    const KIND: ResourceKind = ResourceKind::Patient;

    entity_timestamps!();

    fn ownership(&self) -> Ownership {
        self.account_id.map_or(Ownership::Unowned, Ownership::Account)
    }

    fn validate(&self) -> ValidationResult<()> {
        require_text("name", &self.name)?;
        require_text("email", &self.email)?;
        if !self.email.contains('@') {
            return Err(ValidationError::invalid("email", "must contain '@'"));
        }
        Ok(())
    }
}
