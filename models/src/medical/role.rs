// models/src/medical/role.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ClinicError;

/// The fixed set of account roles. The role decides which permission class a
/// caller falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Doctor,
    Patient,
    LabTechnician,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Doctor, Role::Patient, Role::LabTechnician, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Patient => "patient",
            Role::LabTechnician => "lab_technician",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doctor" => Ok(Role::Doctor),
            "patient" => Ok(Role::Patient),
            "lab_technician" => Ok(Role::LabTechnician),
            "admin" => Ok(Role::Admin),
            other => Err(ClinicError::UnknownRole(other.to_string())),
        }
    }
}
