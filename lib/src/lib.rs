// lib/src/lib.rs

pub mod accounts;
pub mod appointments;
pub mod assist;
pub mod config;
pub mod database;
pub mod extraction;
pub mod notifications;
pub mod service;
pub mod storage_engine;

pub use models::{ClinicError, ClinicResult, ErrorKind, Failure, RecordId, RecordPatch, ResourceKind, Role};
pub use security::{Caller, Operation, PolicyTable, Scope};

pub use crate::accounts::{DoctorListing, SystemStats};
pub use crate::assist::{AssistService, DietPlanRequest, GeneratedDietPlan, HostedTextGenerator, TextGenerator};
pub use crate::config::{ClinicConfig, StorageConfig, StorageEngineType};
pub use crate::database::Database;
pub use crate::extraction::{Extraction, ExtractionService, FileKind, HttpTextExtractor, TextExtractor};
pub use crate::notifications::{mailer_from_config, Mailer, MedicationReminder, NotificationService};
pub use crate::service::ResourceService;
pub use crate::storage_engine::{open_sled_db, RecordStore};
