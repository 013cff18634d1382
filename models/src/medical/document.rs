// models/src/medical/document.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Ownership};
use crate::errors::{require_text, ValidationError, ValidationResult};
use crate::identifiers::{RecordId, ResourceKind};

/// Metadata for an uploaded file. Documents are the one kind that is only
/// ever deleted logically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: RecordId,
    pub account_id: RecordId,
    pub file_name: String,
    pub file_type: Option<String>,
    pub file_size: Option<u64>, // in bytes
    #[serde(default = "Utc::now")]
    pub upload_date: DateTime<Utc>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(account_id: RecordId, file_name: &str) -> Self {
        let now = Utc::now();
        Document {
            id: 0,
            account_id,
            file_name: file_name.to_string(),
            file_type: None,
            file_size: None,
            upload_date: now,
            description: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Document {
    const KIND: ResourceKind = ResourceKind::Document;

    entity_timestamps!();

    fn ownership(&self) -> Ownership {
        Ownership::Account(self.account_id)
    }

    fn validate(&self) -> ValidationResult<()> {
        require_text("file_name", &self.file_name)
    }

    fn check_create(&self) -> ValidationResult<()> {
        if self.is_deleted {
            return Err(ValidationError::invalid("is_deleted", "new documents cannot be deleted"));
        }
        Ok(())
    }

    fn protected_fields() -> &'static [&'static str] {
        &["id", "account_id", "upload_date", "is_deleted", "created_at", "updated_at"]
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn mark_deleted(&mut self) -> bool {
        self.is_deleted = true;
        true
    }
}
