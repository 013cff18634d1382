// models/src/entity.rs

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::ValidationResult;
use crate::identifiers::{RecordId, ResourceKind};

/// Fields no partial update may touch, whatever the record kind.
pub const SYSTEM_FIELDS: &[&str] = &["id", "created_at", "updated_at"];

/// Who a record is scoped to. The ownership resolver turns this plus a caller
/// into an owner verdict; collection scopes match against it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ownership {
    /// Belongs to a single account (profile, documents, plans, chat).
    Account(RecordId),
    /// Written by a doctor about a patient; only the author owns it.
    Authored { doctor: RecordId, patient: RecordId },
    /// Owned jointly by the booking patient and the attending doctor.
    Shared { patient: RecordId, doctor: RecordId },
    /// Owned by the technicians attached to the lab.
    Lab { lab: RecordId, patient: Option<RecordId> },
    Unowned,
}

impl Ownership {
    /// The account a record is about, if any.
    pub fn subject(&self) -> Option<RecordId> {
        match *self {
            Ownership::Account(id) => Some(id),
            Ownership::Authored { patient, .. } | Ownership::Shared { patient, .. } => Some(patient),
            Ownership::Lab { patient, .. } => patient,
            Ownership::Unowned => None,
        }
    }

    pub fn doctor(&self) -> Option<RecordId> {
        match *self {
            Ownership::Authored { doctor, .. } | Ownership::Shared { doctor, .. } => Some(doctor),
            _ => None,
        }
    }

    pub fn lab(&self) -> Option<RecordId> {
        match *self {
            Ownership::Lab { lab, .. } => Some(lab),
            _ => None,
        }
    }
}

/// A persisted clinic record.
///
/// Implementors are plain serde structs; the store treats them as JSON
/// documents and the resource service drives every lifecycle hook below.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn id(&self) -> RecordId;

    /// Stamps a freshly allocated id and creation time.
    fn assign(&mut self, id: RecordId, now: DateTime<Utc>);

    fn touch(&mut self, now: DateTime<Utc>);

    fn ownership(&self) -> Ownership;

    /// Schema-level checks on the record as it would be stored.
    fn validate(&self) -> ValidationResult<()> {
        Ok(())
    }

    /// Account id that must resolve to a doctor-role account.
    fn doctor_reference(&self) -> Option<RecordId> {
        None
    }

    /// Fields a partial update is not allowed to write.
    fn protected_fields() -> &'static [&'static str] {
        SYSTEM_FIELDS
    }

    /// Values no two records of this kind may share, as `(field, normalized
    /// value)` pairs.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Checks made only when the record is first stored.
    fn check_create(&self) -> ValidationResult<()> {
        Ok(())
    }

    /// Checks an update against the previously stored state.
    fn check_update(&self, _previous: &Self) -> ValidationResult<()> {
        Ok(())
    }

    /// Whether moving from `previous` to this state is a clinical act that
    /// only the doctor named by [`doctor_reference`](Self::doctor_reference)
    /// may perform.
    fn needs_attending_doctor(&self, _previous: &Self) -> bool {
        false
    }

    fn is_deleted(&self) -> bool {
        false
    }

    /// Marks the record logically deleted. Returns `false` for kinds that are
    /// removed physically instead.
    fn mark_deleted(&mut self) -> bool {
        false
    }
}

/// Implements the id and timestamp plumbing shared by every entity struct.
macro_rules! entity_timestamps {
    () => {
        fn id(&self) -> $crate::identifiers::RecordId {
            self.id
        }

        fn assign(&mut self, id: $crate::identifiers::RecordId, now: chrono::DateTime<chrono::Utc>) {
            self.id = id;
            self.created_at = now;
            self.updated_at = now;
        }

        fn touch(&mut self, now: chrono::DateTime<chrono::Utc>) {
            self.updated_at = now;
        }
    };
}
