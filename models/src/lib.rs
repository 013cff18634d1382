// models/src/lib.rs

pub mod errors;
pub mod identifiers;
#[macro_use]
pub mod entity;
pub mod patch;
pub mod medical;

pub use entity::{Entity, Ownership, SYSTEM_FIELDS};
pub use errors::{ClinicError, ClinicResult, ErrorKind, Failure, ValidationError, ValidationResult};
pub use identifiers::{RecordId, ResourceKind};
pub use medical::*;
pub use patch::RecordPatch;
