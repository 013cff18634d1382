// lib/src/config/config_structs.rs

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use log::error;
use models::ClinicError;
use serde::{Deserialize, Serialize};

use super::config_defaults::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StorageEngineType {
    Sled,
    InMemory,
}

impl FromStr for StorageEngineType {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sled" => Ok(StorageEngineType::Sled),
            "memory" | "inmemory" | "in_memory" => Ok(StorageEngineType::InMemory),
            _ => {
                error!("Unknown storage engine type: {}", s);
                Err(ClinicError::Config(format!("Unknown storage engine type: {}", s)))
            }
        }
    }
}

impl TryFrom<String> for StorageEngineType {
    type Error = ClinicError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StorageEngineType> for String {
    fn from(engine: StorageEngineType) -> Self {
        engine.to_string()
    }
}

impl fmt::Display for StorageEngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageEngineType::Sled => write!(f, "sled"),
            StorageEngineType::InMemory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_engine_type")]
    pub engine: StorageEngineType,
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            engine: default_storage_engine_type(),
            data_directory: default_data_directory(),
        }
    }
}

/// Hosted, OpenAI-compatible chat-completions service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextGenerationConfig {
    #[serde(default = "default_text_generation_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_text_generation_model")]
    pub model: String,
    #[serde(default = "default_text_generation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TextGenerationConfig {
    fn default() -> Self {
        TextGenerationConfig {
            base_url: default_text_generation_url(),
            api_key: None,
            model: default_text_generation_model(),
            timeout_secs: default_text_generation_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_extraction_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_extraction_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            endpoint: default_extraction_endpoint(),
            timeout_secs: default_extraction_timeout_secs(),
        }
    }
}

/// Outgoing mail. Without a relay URL messages are only logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_email_sender")]
    pub sender: String,
    #[serde(default)]
    pub relay_url: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        EmailConfig {
            sender: default_email_sender(),
            relay_url: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub text_generation: TextGenerationConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub email: EmailConfig,
    /// YAML file with permission overrides applied on top of the default table.
    #[serde(default)]
    pub policy_file: Option<PathBuf>,
}
