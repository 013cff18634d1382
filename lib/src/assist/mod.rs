// lib/src/assist/mod.rs

pub mod chat;
pub mod diet;
pub mod llm;

pub use chat::ChatReply;
pub use diet::{DietPlanRequest, GeneratedDietPlan};
pub use llm::{CompletionRequest, HostedTextGenerator, PromptMessage, TextGenerator};

use std::sync::Arc;

use crate::service::ResourceService;

/// Text-generation conveniences layered on the record service. Every
/// generated result is persisted through the same permission checks as a
/// hand-written record.
#[derive(Clone)]
pub struct AssistService {
    resources: ResourceService,
    generator: Arc<dyn TextGenerator>,
}

impl AssistService {
    pub fn new(resources: ResourceService, generator: Arc<dyn TextGenerator>) -> Self {
        AssistService { resources, generator }
    }

    pub fn resources(&self) -> &ResourceService {
        &self.resources
    }
}
