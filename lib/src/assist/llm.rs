// lib/src/assist/llm.rs

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use models::{ClinicError, ClinicResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::TextGenerationConfig;

const SERVICE: &str = "text-generation";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        PromptMessage { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        PromptMessage { role: "user".to_string(), content: content.into() }
    }
}

/// One completion call: the conversation so far plus sampling settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<PromptMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    /// Ask the model to answer with a single JSON object.
    pub json_response: bool,
}

/// Anything that turns a prompt into text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync + 'static {
    async fn generate(&self, request: CompletionRequest) -> ClinicResult<String>;
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// Each call is bounded by the configured timeout and is not retried.
#[derive(Debug, Clone)]
pub struct HostedTextGenerator {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

impl HostedTextGenerator {
    pub fn new(config: &TextGenerationConfig) -> Self {
        HostedTextGenerator {
            client: Client::new(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "top_p": request.top_p,
            "stream": false,
        });
        if request.json_response {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }

    async fn send(&self, api_key: &str, body: &Value) -> ClinicResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ClinicError::external(SERVICE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ClinicError::external(SERVICE, format!("HTTP {}: {}", status, detail)));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ClinicError::external(SERVICE, format!("malformed completion: {}", e)))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ClinicError::external(SERVICE, "completion had no choices"))
    }
}

#[async_trait]
impl TextGenerator for HostedTextGenerator {
    async fn generate(&self, request: CompletionRequest) -> ClinicResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ClinicError::external(SERVICE, "no API key configured"))?;
        let body = self.request_body(&request);
        debug!("Requesting completion from {} ({} messages)", self.endpoint, request.messages.len());

        match tokio::time::timeout(self.timeout, self.send(api_key, &body)).await {
            Ok(result) => result.inspect_err(|e| error!("Completion request failed: {}", e)),
            Err(_) => {
                error!("Completion request timed out after {:?}", self.timeout);
                Err(ClinicError::external(SERVICE, format!("timed out after {:?}", self.timeout)))
            }
        }
    }
}
