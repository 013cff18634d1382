// models/src/medical/chat.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Ownership};
use crate::errors::{require_text, ValidationResult};
use crate::identifiers::{RecordId, ResourceKind};

/// One exchange with the assistant: what the account asked and what came back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: RecordId,
    pub account_id: RecordId,
    pub message: String,
    pub response: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(account_id: RecordId, message: &str, response: &str) -> Self {
        let now = Utc::now();
        ChatMessage {
            id: 0,
            account_id,
            message: message.to_string(),
            response: response.to_string(),
            timestamp: now,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for ChatMessage {
    const KIND: ResourceKind = ResourceKind::ChatMessage;

    entity_timestamps!();

    fn ownership(&self) -> Ownership {
        Ownership::Account(self.account_id)
    }

    fn validate(&self) -> ValidationResult<()> {
        require_text("message", &self.message)
    }
}
