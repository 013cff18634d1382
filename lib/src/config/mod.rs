// lib/src/config/mod.rs

pub mod config_defaults;
pub mod config_structs;

pub use config_defaults::*;
pub use config_structs::{
    ClinicConfig, EmailConfig, ExtractionConfig, StorageConfig, StorageEngineType, TextGenerationConfig,
};

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use security::PolicyTable;

impl ClinicConfig {
    /// Parses a YAML document. Missing sections fall back to their defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(ClinicConfig::default());
        }
        serde_yaml::from_str(content).context("Failed to parse clinic configuration")
    }

    pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        debug!("Raw YAML content from {:?}:\n{}", path, content);
        let config = ClinicConfig::from_yaml_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Loads `path`, or the defaults when no file is given, then applies the
    /// environment (`.env` included).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // A missing .env file is fine.
        if let Ok(env_path) = dotenvy::dotenv() {
            debug!("Loaded environment from {:?}", env_path);
        }
        let mut config = match path {
            Some(path) => ClinicConfig::load_from_yaml(path)?,
            None => ClinicConfig::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|key| !key.trim().is_empty()) {
            debug!("Text generation API key taken from {}", API_KEY_ENV);
            self.text_generation.api_key = Some(key);
        }
    }

    /// The default permission table, with the configured overrides applied.
    pub fn policy_table(&self) -> Result<PolicyTable> {
        match &self.policy_file {
            Some(path) => PolicyTable::from_yaml_file(path),
            None => Ok(PolicyTable::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn empty_document_yields_defaults() {
        let config = ClinicConfig::from_yaml_str("").unwrap();
        assert_eq!(config, ClinicConfig::default());
        assert_eq!(config.storage.engine, StorageEngineType::Sled);
        assert_eq!(config.text_generation.model, "llama3-8b-8192");
        assert_eq!(config.extraction.endpoint, DEFAULT_EXTRACTION_ENDPOINT);
    }

    #[test]
    fn sections_override_only_what_they_name() {
        let yaml = r#"
storage:
  engine: InMemory
text_generation:
  timeout_secs: 5
email:
  relay_url: http://127.0.0.1:9025/send
"#;
        let config = ClinicConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.storage.engine, StorageEngineType::InMemory);
        assert_eq!(config.storage.data_directory, PathBuf::from(DEFAULT_DATA_DIRECTORY));
        assert_eq!(config.text_generation.timeout_secs, 5);
        assert_eq!(config.text_generation.base_url, DEFAULT_TEXT_GENERATION_URL);
        assert_eq!(config.email.relay_url.as_deref(), Some("http://127.0.0.1:9025/send"));
        assert_eq!(config.email.sender, DEFAULT_EMAIL_SENDER);
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let err = ClinicConfig::from_yaml_str("storage:\n  engine: rocksdb\n").unwrap_err();
        assert!(format!("{:#}", err).contains("Unknown storage engine type"));
    }

    #[test]
    fn engine_names_round_trip() {
        for engine in [StorageEngineType::Sled, StorageEngineType::InMemory] {
            assert_eq!(engine.to_string().parse::<StorageEngineType>().unwrap(), engine);
        }
    }

    #[test]
    fn api_key_comes_from_the_environment() {
        let mut config = ClinicConfig::default();
        config.apply_env_overrides(|key| (key == API_KEY_ENV).then(|| "gsk-test".to_string()));
        assert_eq!(config.text_generation.api_key.as_deref(), Some("gsk-test"));

        let mut blank = ClinicConfig::default();
        blank.apply_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(blank.text_generation.api_key, None);
    }

    #[test]
    fn loads_from_file_and_resolves_policy_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let policy_path = dir.path().join("policy.yaml");
        fs::write(&policy_path, "rules:\n  - kind: lab_test\n    operation: list\n    allow: roles\n    roles: [doctor]\n").unwrap();

        let config_path = dir.path().join(DEFAULT_CONFIG_FILE);
        let mut file = fs::File::create(&config_path).unwrap();
        writeln!(file, "storage:\n  engine: memory\npolicy_file: {}", policy_path.display()).unwrap();

        let config = ClinicConfig::load_from_yaml(&config_path).unwrap();
        assert_eq!(config.policy_file.as_deref(), Some(policy_path.as_path()));
        let table = config.policy_table().unwrap();
        assert_eq!(
            table.rule(models::ResourceKind::LabTest, security::Operation::List),
            Some(&security::Rule::Roles(vec![models::Role::Doctor]))
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(ClinicConfig::load_from_yaml("/definitely/not/here/clinic.yaml").is_err());
    }
}
