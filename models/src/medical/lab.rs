// models/src/medical/lab.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Ownership};
use crate::errors::{require_text, ValidationResult};
use crate::identifiers::{RecordId, ResourceKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lab {
    pub id: RecordId,
    pub name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lab {
    pub fn new(name: &str) -> Self {
        let now = Utc::now();
        Lab {
            id: 0,
            name: name.to_string(),
            address: None,
            phone_number: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Lab {
    const KIND: ResourceKind = ResourceKind::Lab;

    entity_timestamps!();

    fn ownership(&self) -> Ownership {
        Ownership::Lab { lab: self.id, patient: None }
    }

    fn validate(&self) -> ValidationResult<()> {
        require_text("name", &self.name)
    }
}

/// Attaches a lab technician account to the lab they work in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabTechnicianProfile {
    pub id: RecordId,
    pub account_id: RecordId,
    pub lab_id: RecordId,
    pub years_of_experience: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LabTechnicianProfile {
    pub fn new(account_id: RecordId, lab_id: RecordId) -> Self {
        let now = Utc::now();
        LabTechnicianProfile {
            id: 0,
            account_id,
            lab_id,
            years_of_experience: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for LabTechnicianProfile {
    const KIND: ResourceKind = ResourceKind::LabTechnicianProfile;

    entity_timestamps!();

    fn ownership(&self) -> Ownership {
        Ownership::Account(self.account_id)
    }

    // The lab assignment decides lab ownership, so only admins move it.
    fn protected_fields() -> &'static [&'static str] {
        &["id", "account_id", "lab_id", "created_at", "updated_at"]
    }
}

/// A test ordered by a doctor for a patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabTest {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub test_name: String,
    pub test_date: DateTime<Utc>,
    pub result: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LabTest {
    pub fn new(patient_id: RecordId, test_name: &str, test_date: DateTime<Utc>) -> Self {
        let now = Utc::now();
        LabTest {
            id: 0,
            patient_id,
            test_name: test_name.to_string(),
            test_date,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for LabTest {
    const KIND: ResourceKind = ResourceKind::LabTest;

    entity_timestamps!();

    fn ownership(&self) -> Ownership {
        Ownership::Account(self.patient_id)
    }

    fn validate(&self) -> ValidationResult<()> {
        require_text("test_name", &self.test_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabReport {
    pub id: RecordId,
    pub lab_id: RecordId,
    pub patient_id: RecordId,
    pub doctor_id: Option<RecordId>,
    pub test_name: String,
    pub test_date: NaiveDate,
    pub result: String,
    pub reference_range: Option<String>,
    pub interpretation: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LabReport {
    pub fn new(lab_id: RecordId, patient_id: RecordId, test_name: &str, test_date: NaiveDate, result: &str) -> Self {
        let now = Utc::now();
        LabReport {
            id: 0,
            lab_id,
            patient_id,
            doctor_id: None,
            test_name: test_name.to_string(),
            test_date,
            result: result.to_string(),
            reference_range: None,
            interpretation: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for LabReport {
    const KIND: ResourceKind = ResourceKind::LabReport;

    entity_timestamps!();

    fn ownership(&self) -> Ownership {
        Ownership::Lab { lab: self.lab_id, patient: Some(self.patient_id) }
    }

    fn validate(&self) -> ValidationResult<()> {
        require_text("test_name", &self.test_name)?;
        require_text("result", &self.result)
    }

    fn doctor_reference(&self) -> Option<RecordId> {
        self.doctor_id
    }

    fn protected_fields() -> &'static [&'static str] {
        &["id", "lab_id", "created_at", "updated_at"]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    #[default]
    Operational,
    UnderMaintenance,
    OutOfOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabEquipment {
    pub id: RecordId,
    pub lab_id: RecordId,
    pub name: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub last_maintenance_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: EquipmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LabEquipment {
    pub fn new(lab_id: RecordId, name: &str) -> Self {
        let now = Utc::now();
        LabEquipment {
            id: 0,
            lab_id,
            name: name.to_string(),
            model: None,
            serial_number: None,
            purchase_date: None,
            last_maintenance_date: None,
            status: EquipmentStatus::default(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for LabEquipment {
    const KIND: ResourceKind = ResourceKind::LabEquipment;

    entity_timestamps!();

    fn ownership(&self) -> Ownership {
        Ownership::Lab { lab: self.lab_id, patient: None }
    }

    fn validate(&self) -> ValidationResult<()> {
        require_text("name", &self.name)
    }

    fn protected_fields() -> &'static [&'static str] {
        &["id", "lab_id", "created_at", "updated_at"]
    }
}
