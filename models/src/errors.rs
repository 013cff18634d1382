// models/src/errors.rs

pub use thiserror::Error;

use serde::{Deserialize, Serialize};

use crate::identifiers::{RecordId, ResourceKind};

#[derive(Debug, Error)]
pub enum ClinicError {
    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: RecordId },
    #[error("Permission denied: {0}")]
    Authorization(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Unknown role: {0}")]
    UnknownRole(String),
    #[error("{service} service failed: {message}")]
    ExternalService { service: String, message: String },
    #[error("Storage error: {0}")]
    Storage(String), // General storage operation error
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[cfg(feature = "sled-errors")]
    #[error(transparent)]
    Sled(#[from] sled::Error),
}

impl ClinicError {
    pub fn not_found(kind: ResourceKind, id: RecordId) -> Self {
        ClinicError::NotFound { kind, id }
    }

    pub fn external(service: impl Into<String>, message: impl Into<String>) -> Self {
        ClinicError::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Coarse classification used when the error crosses an API boundary.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClinicError::NotFound { .. } => ErrorKind::NotFound,
            ClinicError::Authorization(_) => ErrorKind::Authorization,
            ClinicError::Validation(_) => ErrorKind::Validation,
            ClinicError::UnknownRole(_) => ErrorKind::UnknownRole,
            ClinicError::ExternalService { .. } => ErrorKind::ExternalService,
            ClinicError::Storage(_) | ClinicError::Serialization(_) | ClinicError::Config(_) => {
                ErrorKind::Internal
            }
            #[cfg(feature = "sled-errors")]
            ClinicError::Sled(_) => ErrorKind::Internal,
        }
    }

    pub fn failure(&self) -> Failure {
        Failure {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

impl From<serde_json::Error> for ClinicError {
    fn from(err: serde_json::Error) -> Self {
        ClinicError::Serialization(format!("JSON processing error: {}", err))
    }
}

impl From<bcrypt::BcryptError> for ClinicError {
    fn from(_: bcrypt::BcryptError) -> Self {
        ClinicError::Validation(ValidationError::PasswordHashingFailed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Authorization,
    Validation,
    UnknownRole,
    ExternalService,
    Internal,
}

/// Structured failure handed back to whoever invoked the core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

/// A validation error.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("required field {0} is missing or empty")]
    MissingField(String),
    /// A value does not have the expected shape.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    /// A patch names a field the record does not have.
    #[error("unexpected field {0}")]
    UnknownField(String),
    /// A patch tries to write a field that only the system may change.
    #[error("field {0} is read-only and cannot be changed")]
    ReadOnlyField(String),
    #[error("{field} must not be before {start_field}")]
    InvalidDateRange { start_field: String, field: String },
    /// The account referenced as the treating doctor is not a doctor.
    #[error("account {0} is not a doctor")]
    NotADoctor(RecordId),
    #[error("appointment cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("{field} {value} is already in use")]
    Duplicate { field: String, value: String },
    #[error("password hashing failed")]
    PasswordHashingFailed,
}

impl ValidationError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// A type alias for a `Result` that returns a `ClinicError` on failure.
pub type ClinicResult<T> = Result<T, ClinicError>;

/// A type alias for a `Result` that returns a `ValidationError` on failure.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Fails with `MissingField` when `value` is empty or whitespace.
pub fn require_text(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field.to_string()));
    }
    Ok(())
}
