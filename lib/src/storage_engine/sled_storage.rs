// lib/src/storage_engine/sled_storage.rs

use std::path::Path;

use async_trait::async_trait;
use log::{debug, info};
use models::{ClinicError, ClinicResult, RecordId, ResourceKind};
use sled::{Db, Tree};

use super::storage_engine::RecordStore;

/// Opens (creating if needed) a sled database under `path`.
pub fn open_sled_db(path: &Path) -> ClinicResult<Db> {
    std::fs::create_dir_all(path).map_err(|e| {
        ClinicError::Storage(format!("Failed to create data directory {}: {}", path.display(), e))
    })?;
    let db = sled::open(path)?;
    info!("Opened sled database at {}", path.display());
    Ok(db)
}

/// One sled tree per resource kind; keys are big-endian ids so tree order is
/// id order.
#[derive(Debug, Clone)]
pub struct SledRecordStore {
    db: Db,
}

impl SledRecordStore {
    pub fn new(db: Db) -> Self {
        SledRecordStore { db }
    }

    pub fn open(path: &Path) -> ClinicResult<Self> {
        Ok(SledRecordStore::new(open_sled_db(path)?))
    }

    /// A database that disappears when the store is dropped.
    pub fn temporary() -> ClinicResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(SledRecordStore::new(db))
    }

    fn tree(&self, kind: ResourceKind) -> ClinicResult<Tree> {
        Ok(self.db.open_tree(kind.tree_name())?)
    }
}

fn record_key(id: RecordId) -> [u8; 8] {
    id.to_be_bytes()
}

fn decode_key(kind: ResourceKind, key: &[u8]) -> ClinicResult<RecordId> {
    let bytes: [u8; 8] = key
        .try_into()
        .map_err(|_| ClinicError::Storage(format!("Malformed key of length {} in {}", key.len(), kind.tree_name())))?;
    Ok(RecordId::from_be_bytes(bytes))
}

#[async_trait]
impl RecordStore for SledRecordStore {
    async fn next_id(&self, _kind: ResourceKind) -> ClinicResult<RecordId> {
        // sled starts counting at zero
        Ok(self.db.generate_id()? + 1)
    }

    async fn put(&self, kind: ResourceKind, id: RecordId, value: Vec<u8>) -> ClinicResult<()> {
        self.tree(kind)?.insert(record_key(id), value)?;
        Ok(())
    }

    async fn get(&self, kind: ResourceKind, id: RecordId) -> ClinicResult<Option<Vec<u8>>> {
        Ok(self.tree(kind)?.get(record_key(id))?.map(|value| value.to_vec()))
    }

    async fn remove(&self, kind: ResourceKind, id: RecordId) -> ClinicResult<bool> {
        Ok(self.tree(kind)?.remove(record_key(id))?.is_some())
    }

    async fn scan(&self, kind: ResourceKind) -> ClinicResult<Vec<(RecordId, Vec<u8>)>> {
        let mut records = Vec::new();
        for item in self.tree(kind)?.iter() {
            let (key, value) = item?;
            records.push((decode_key(kind, &key)?, value.to_vec()));
        }
        Ok(records)
    }

    async fn flush(&self) -> ClinicResult<()> {
        let bytes_flushed = self.db.flush_async().await?;
        debug!("SledRecordStore::flush - flushed {} bytes", bytes_flushed);
        Ok(())
    }

    fn engine_name(&self) -> &'static str {
        "sled"
    }
}
