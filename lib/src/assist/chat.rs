// lib/src/assist/chat.rs

use chrono::{DateTime, Utc};
use log::debug;
use models::{Account, ChatMessage, ClinicError, ClinicResult, Ownership, RecordId, ResourceKind};
use security::{Caller, Operation, Scope};
use serde::{Deserialize, Serialize};

use super::llm::{CompletionRequest, PromptMessage};
use super::AssistService;

const SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant for a healthcare application. Provide concise and informative responses.";
const HISTORY_LENGTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ChatMessage> for ChatReply {
    fn from(entry: ChatMessage) -> Self {
        ChatReply {
            message: entry.response,
            timestamp: entry.timestamp,
        }
    }
}

impl AssistService {
    pub async fn chat(&self, caller: &Caller, account_id: RecordId, message: &str) -> ClinicResult<ChatReply> {
        self.resources
            .database()
            .fetch::<Account>(account_id)
            .await?
            .ok_or_else(|| ClinicError::not_found(ResourceKind::Account, account_id))?;
        self.resources.authorize(
            caller,
            Operation::Create,
            ResourceKind::ChatMessage,
            Some(&Ownership::Account(account_id)),
        )?;

        let completion = CompletionRequest {
            messages: vec![PromptMessage::system(SYSTEM_PROMPT), PromptMessage::user(message)],
            temperature: 0.7,
            max_tokens: 150,
            top_p: 1.0,
            json_response: false,
        };
        let response = self.generator.generate(completion).await?;
        let stored = self
            .resources
            .create(caller, ChatMessage::new(account_id, message, &response))
            .await?;
        debug!("Stored chat message {} for account {}", stored.id, account_id);
        Ok(stored.into())
    }

    /// The most recent replies, newest first.
    pub async fn chat_history(&self, caller: &Caller, account_id: RecordId) -> ClinicResult<Vec<ChatReply>> {
        let mut entries: Vec<ChatMessage> = self.resources.list(caller, Scope::Account(account_id)).await?;
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(entries.into_iter().take(HISTORY_LENGTH).map(ChatReply::from).collect())
    }
}
