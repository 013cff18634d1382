// lib/src/config/config_defaults.rs

use std::path::PathBuf;

use super::config_structs::StorageEngineType;

pub const DEFAULT_CONFIG_FILE: &str = "clinic.yaml";
pub const DEFAULT_DATA_DIRECTORY: &str = "./clinic_data";
pub const DEFAULT_TEXT_GENERATION_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_TEXT_GENERATION_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_EXTRACTION_ENDPOINT: &str = "http://127.0.0.1:8000/extract/";
pub const DEFAULT_EMAIL_SENDER: &str = "no-reply@clinic.local";
/// Environment variable that overrides `text_generation.api_key`.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

pub fn default_storage_engine_type() -> StorageEngineType { StorageEngineType::Sled }
pub fn default_data_directory() -> PathBuf { PathBuf::from(DEFAULT_DATA_DIRECTORY) }
pub fn default_text_generation_url() -> String { DEFAULT_TEXT_GENERATION_URL.to_string() }
pub fn default_text_generation_model() -> String { DEFAULT_TEXT_GENERATION_MODEL.to_string() }
pub fn default_text_generation_timeout_secs() -> u64 { 30 }
pub fn default_extraction_endpoint() -> String { DEFAULT_EXTRACTION_ENDPOINT.to_string() }
pub fn default_extraction_timeout_secs() -> u64 { 60 }
pub fn default_email_sender() -> String { DEFAULT_EMAIL_SENDER.to_string() }
