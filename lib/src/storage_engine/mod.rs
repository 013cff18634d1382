// lib/src/storage_engine/mod.rs

pub mod inmemory_storage;
pub mod sled_storage;
pub mod storage_engine;

pub use inmemory_storage::MemoryRecordStore;
pub use sled_storage::{open_sled_db, SledRecordStore};
pub use storage_engine::RecordStore;

use std::sync::Arc;

use log::info;
use models::ClinicResult;

use crate::config::{StorageConfig, StorageEngineType};

/// Builds the record store selected by the storage configuration.
pub fn create_store(config: &StorageConfig) -> ClinicResult<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match config.engine {
        StorageEngineType::Sled => Arc::new(SledRecordStore::open(&config.data_directory)?),
        StorageEngineType::InMemory => Arc::new(MemoryRecordStore::new()),
    };
    info!("Using {} record store", store.engine_name());
    Ok(store)
}
