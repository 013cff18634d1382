// models/src/identifiers.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};

/// Store-allocated record id. Ids are strictly positive; `0` marks a record
/// that has not been persisted yet.
pub type RecordId = u64;

/// Every kind of record the clinic keeps. Each kind lives in its own storage
/// tree and has its own row in the permission table.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Account,
    Patient,
    DoctorProfile,
    LabTechnicianProfile,
    Lab,
    Appointment,
    Diagnosis,
    Prescription,
    LabTest,
    LabReport,
    LabEquipment,
    NutritionalPlan,
    Document,
    ChatMessage,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 14] = [
        ResourceKind::Account,
        ResourceKind::Patient,
        ResourceKind::DoctorProfile,
        ResourceKind::LabTechnicianProfile,
        ResourceKind::Lab,
        ResourceKind::Appointment,
        ResourceKind::Diagnosis,
        ResourceKind::Prescription,
        ResourceKind::LabTest,
        ResourceKind::LabReport,
        ResourceKind::LabEquipment,
        ResourceKind::NutritionalPlan,
        ResourceKind::Document,
        ResourceKind::ChatMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Account => "account",
            ResourceKind::Patient => "patient",
            ResourceKind::DoctorProfile => "doctor_profile",
            ResourceKind::LabTechnicianProfile => "lab_technician_profile",
            ResourceKind::Lab => "lab",
            ResourceKind::Appointment => "appointment",
            ResourceKind::Diagnosis => "diagnosis",
            ResourceKind::Prescription => "prescription",
            ResourceKind::LabTest => "lab_test",
            ResourceKind::LabReport => "lab_report",
            ResourceKind::LabEquipment => "lab_equipment",
            ResourceKind::NutritionalPlan => "nutritional_plan",
            ResourceKind::Document => "document",
            ResourceKind::ChatMessage => "chat_message",
        }
    }

    /// Name of the storage tree holding records of this kind.
    pub fn tree_name(&self) -> String {
        format!("clinic/{}", self.as_str())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        ResourceKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ValidationError::invalid("resource_kind", format!("unknown kind '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::ResourceKind;
    use core::str::FromStr;

    #[test]
    fn should_round_trip_every_kind_through_display() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_str(&kind.to_string()).unwrap(), kind);
        }
    }

    #[test]
    fn should_accept_dashed_names() {
        assert_eq!(ResourceKind::from_str("lab-report").unwrap(), ResourceKind::LabReport);
    }

    #[test]
    fn should_not_parse_unknown_kind() {
        assert!(ResourceKind::from_str("invoice").is_err());
    }

    #[test]
    fn should_namespace_tree_names() {
        assert_eq!(ResourceKind::LabEquipment.tree_name(), "clinic/lab_equipment");
    }
}
