// models/src/medical/doctor.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Ownership};
use crate::errors::{require_text, ValidationResult};
use crate::identifiers::{RecordId, ResourceKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: RecordId,
    pub account_id: RecordId,
    pub specialization: String,
    pub license_number: String,
    pub years_of_experience: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DoctorProfile {
    pub fn new(account_id: RecordId, specialization: &str, license_number: &str) -> Self {
        let now = Utc::now();
        DoctorProfile {
            id: 0,
            account_id,
            specialization: specialization.to_string(),
            license_number: license_number.to_string(),
            years_of_experience: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for DoctorProfile {
    const KIND: ResourceKind = ResourceKind::DoctorProfile;

    entity_timestamps!();

    fn ownership(&self) -> Ownership {
        Ownership::Account(self.account_id)
    }

    fn validate(&self) -> ValidationResult<()> {
        require_text("specialization", &self.specialization)?;
        require_text("license_number", &self.license_number)
    }

    fn protected_fields() -> &'static [&'static str] {
        &["id", "account_id", "license_number", "created_at", "updated_at"]
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("license_number", self.license_number.trim().to_string())]
    }
}
