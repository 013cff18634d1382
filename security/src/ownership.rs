// security/src/ownership.rs
use std::str::FromStr;

use models::{Ownership, RecordId, Role, ValidationError};

use crate::roles::Caller;

/// Decides whether `caller` (already classified as `role`) owns a record.
///
/// - account records belong to the account they name;
/// - doctor-authored records belong to their author, and only while the
///   author holds the doctor role;
/// - shared records (appointments) belong to the booking patient and to the
///   attending doctor;
/// - lab records belong to lab technicians attached to that lab.
pub fn is_owner(caller: &Caller, role: Role, ownership: &Ownership) -> bool {
    match *ownership {
        Ownership::Account(account_id) => caller.id == account_id,
        Ownership::Authored { doctor, .. } => caller.id == doctor && role == Role::Doctor,
        Ownership::Shared { patient, doctor } => {
            caller.id == patient || (caller.id == doctor && role == Role::Doctor)
        }
        Ownership::Lab { lab, .. } => role == Role::LabTechnician && caller.works_at(lab),
        Ownership::Unowned => false,
    }
}

/// Whether the record is about the caller: the patient a diagnosis names,
/// the account a profile belongs to. Counts as ownership for reads only, as
/// it does when the caller lists their own scope.
pub fn is_subject(caller: &Caller, ownership: &Ownership) -> bool {
    ownership.subject() == Some(caller.id)
}

/// The slice of a collection a list request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    /// Records about one account (its own, or a patient's).
    Account(RecordId),
    /// Records a doctor authored or attends.
    Doctor(RecordId),
    Lab(RecordId),
}

impl Scope {
    pub fn matches(&self, ownership: &Ownership) -> bool {
        match *self {
            Scope::All => true,
            Scope::Account(id) => ownership.subject() == Some(id),
            Scope::Doctor(id) => ownership.doctor() == Some(id),
            Scope::Lab(id) => ownership.lab() == Some(id),
        }
    }
}

impl FromStr for Scope {
    type Err = ValidationError;

    /// `all`, or one of `account:<id>`, `doctor:<id>` and `lab:<id>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Scope::All);
        }
        let invalid = || {
            ValidationError::invalid("scope", format!("expected all or <account|doctor|lab>:<id>, got '{}'", s))
        };
        let (slice, id) = s.split_once(':').ok_or_else(invalid)?;
        let id: RecordId = id.trim().parse().map_err(|_| invalid())?;
        match slice.to_lowercase().as_str() {
            "account" => Ok(Scope::Account(id)),
            "doctor" => Ok(Scope::Doctor(id)),
            "lab" => Ok(Scope::Lab(id)),
            _ => Err(invalid()),
        }
    }
}

/// Whether the caller owns everything a scoped list could return. Listing the
/// whole collection is never an owner read.
pub fn scope_owned_by(caller: &Caller, role: Role, scope: &Scope) -> bool {
    match *scope {
        Scope::All => false,
        Scope::Account(id) => caller.id == id,
        Scope::Doctor(id) => caller.id == id && role == Role::Doctor,
        Scope::Lab(id) => role == Role::LabTechnician && caller.works_at(id),
    }
}
