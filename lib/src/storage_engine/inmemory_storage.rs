// lib/src/storage_engine/inmemory_storage.rs

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use models::{ClinicResult, RecordId, ResourceKind};
use tokio::sync::RwLock;

use super::storage_engine::RecordStore;

#[derive(Debug, Default)]
struct MemoryTrees {
    last_id: RecordId,
    trees: HashMap<ResourceKind, BTreeMap<RecordId, Vec<u8>>>,
}

/// Process-local store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    inner: RwLock<MemoryTrees>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        MemoryRecordStore::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn next_id(&self, _kind: ResourceKind) -> ClinicResult<RecordId> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        Ok(inner.last_id)
    }

    async fn put(&self, kind: ResourceKind, id: RecordId, value: Vec<u8>) -> ClinicResult<()> {
        let mut inner = self.inner.write().await;
        inner.trees.entry(kind).or_default().insert(id, value);
        Ok(())
    }

    async fn get(&self, kind: ResourceKind, id: RecordId) -> ClinicResult<Option<Vec<u8>>> {
        let inner = self.inner.read().await;
        Ok(inner.trees.get(&kind).and_then(|tree| tree.get(&id)).cloned())
    }

    async fn remove(&self, kind: ResourceKind, id: RecordId) -> ClinicResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .trees
            .get_mut(&kind)
            .map(|tree| tree.remove(&id).is_some())
            .unwrap_or(false))
    }

    async fn scan(&self, kind: ResourceKind) -> ClinicResult<Vec<(RecordId, Vec<u8>)>> {
        let inner = self.inner.read().await;
        Ok(inner
            .trees
            .get(&kind)
            .map(|tree| tree.iter().map(|(id, value)| (*id, value.clone())).collect())
            .unwrap_or_default())
    }

    async fn flush(&self) -> ClinicResult<()> {
        Ok(())
    }

    fn engine_name(&self) -> &'static str {
        "memory"
    }
}
