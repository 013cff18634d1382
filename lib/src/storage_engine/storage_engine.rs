// lib/src/storage_engine/storage_engine.rs

use async_trait::async_trait;
use models::{ClinicResult, RecordId, ResourceKind};

/// Raw record persistence. Values are opaque serialized records keyed by id
/// and grouped by resource kind; one call is one atomic write.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Allocates a fresh, strictly positive record id.
    async fn next_id(&self, kind: ResourceKind) -> ClinicResult<RecordId>;
    /// Inserts or replaces a record.
    async fn put(&self, kind: ResourceKind, id: RecordId, value: Vec<u8>) -> ClinicResult<()>;
    async fn get(&self, kind: ResourceKind, id: RecordId) -> ClinicResult<Option<Vec<u8>>>;
    /// Removes a record, returning whether it existed.
    async fn remove(&self, kind: ResourceKind, id: RecordId) -> ClinicResult<bool>;
    /// Every record of a kind, in ascending id order.
    async fn scan(&self, kind: ResourceKind) -> ClinicResult<Vec<(RecordId, Vec<u8>)>>;
    async fn flush(&self) -> ClinicResult<()>;
    fn engine_name(&self) -> &'static str;
}
