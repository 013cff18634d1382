// lib/src/database.rs

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};
use models::{ClinicError, ClinicResult, Entity, RecordId};

use crate::config::StorageConfig;
use crate::storage_engine::{create_store, MemoryRecordStore, RecordStore};

/// Typed access to the record store.
///
/// A `Database` is an explicit handle: it is opened from configuration at
/// start-up, cloned into whatever needs it, and closed at shutdown. Records
/// are stored as JSON documents.
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn RecordStore>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").field("engine", &self.store.engine_name()).finish()
    }
}

impl Database {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Database { store }
    }

    pub async fn open(config: &StorageConfig) -> ClinicResult<Self> {
        let store = create_store(config)?;
        info!("Database opened with {} engine", store.engine_name());
        Ok(Database::new(store))
    }

    pub fn in_memory() -> Self {
        Database::new(Arc::new(MemoryRecordStore::new()))
    }

    pub fn engine_name(&self) -> &'static str {
        self.store.engine_name()
    }

    /// Flushes outstanding writes.
    pub async fn close(&self) -> ClinicResult<()> {
        self.store.flush().await?;
        info!("Database ({}) closed", self.store.engine_name());
        Ok(())
    }

    /// Allocates an id, stamps creation times and stores the record.
    pub async fn insert<E: Entity>(&self, mut record: E) -> ClinicResult<E> {
        let id = self.store.next_id(E::KIND).await?;
        record.assign(id, Utc::now());
        self.save(&record).await?;
        debug!("Inserted {} {}", E::KIND, id);
        Ok(record)
    }

    pub async fn fetch<E: Entity>(&self, id: RecordId) -> ClinicResult<Option<E>> {
        match self.store.get(E::KIND, id).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Writes the record under its current id, replacing any previous version.
    pub async fn save<E: Entity>(&self, record: &E) -> ClinicResult<()> {
        let bytes = serde_json::to_vec(record)?;
        self.store.put(E::KIND, record.id(), bytes).await
    }

    pub async fn remove<E: Entity>(&self, id: RecordId) -> ClinicResult<bool> {
        self.store.remove(E::KIND, id).await
    }

    pub async fn all<E: Entity>(&self) -> ClinicResult<Vec<E>> {
        self.store
            .scan(E::KIND)
            .await?
            .into_iter()
            .map(|(_, bytes)| serde_json::from_slice::<E>(&bytes).map_err(ClinicError::from))
            .collect()
    }

    pub async fn find<E, F>(&self, filter: F) -> ClinicResult<Vec<E>>
    where
        E: Entity,
        F: Fn(&E) -> bool + Send,
    {
        Ok(self.all::<E>().await?.into_iter().filter(|record| filter(record)).collect())
    }

    pub async fn first<E, F>(&self, filter: F) -> ClinicResult<Option<E>>
    where
        E: Entity,
        F: Fn(&E) -> bool + Send,
    {
        Ok(self.all::<E>().await?.into_iter().find(|record| filter(record)))
    }

    pub async fn count<E, F>(&self, filter: F) -> ClinicResult<usize>
    where
        E: Entity,
        F: Fn(&E) -> bool + Send,
    {
        Ok(self.all::<E>().await?.iter().filter(|record| filter(record)).count())
    }
}
