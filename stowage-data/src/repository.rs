use std::future::Future;

use serde_json::Value;

use crate::entity::EntitySchema;
use crate::error::DataError;
use crate::filter::Filter;
use crate::params::FindParams;
use crate::record::{DeleteResult, Record, Removed, ServiceSettings, UpdatePatch, UpdateResult};

/// Uniform CRUD/query contract a host service calls against one bound entity.
///
/// Lifecycle: `init` binds the entity once, `connect` opens the backend,
/// `disconnect` closes it. Every data operation in between fails with
/// [`DataError::NotConnected`] outside a connection.
///
/// Uses RPITIT (return-position `impl Trait` in traits), no `async-trait` needed.
pub trait StorageAdapter: Send + Sync {
    /// Bind the entity definition and service settings. Allowed once.
    fn init(&self, schema: EntitySchema, settings: ServiceSettings) -> Result<(), DataError>;

    fn connect(&self) -> impl Future<Output = Result<(), DataError>> + Send;
    fn disconnect(&self) -> impl Future<Output = Result<(), DataError>> + Send;

    fn find(&self, params: Option<&FindParams>) -> impl Future<Output = Result<Vec<Record>, DataError>> + Send;
    fn count(&self, params: Option<&FindParams>) -> impl Future<Output = Result<u64, DataError>> + Send;
    fn find_one(&self, params: Option<&FindParams>) -> impl Future<Output = Result<Option<Record>, DataError>> + Send;
    fn find_by_id(&self, id: Value) -> impl Future<Output = Result<Option<Record>, DataError>> + Send;
    fn find_by_ids(&self, ids: &[Value]) -> impl Future<Output = Result<Vec<Record>, DataError>> + Send;

    fn insert(&self, record: Record) -> impl Future<Output = Result<Record, DataError>> + Send;
    fn insert_many(&self, records: Vec<Record>) -> impl Future<Output = Result<Vec<Record>, DataError>> + Send;

    /// Alias of [`insert`](Self::insert).
    fn create(&self, record: Record) -> impl Future<Output = Result<Record, DataError>> + Send {
        self.insert(record)
    }

    fn update_many(&self, filter: &Filter, patch: Record) -> impl Future<Output = Result<UpdateResult, DataError>> + Send;
    fn update_by_id(&self, id: Value, patch: UpdatePatch) -> impl Future<Output = Result<Option<Record>, DataError>> + Send;

    fn remove_many(&self, filter: &Filter) -> impl Future<Output = Result<DeleteResult, DataError>> + Send;
    fn remove_by_id(&self, id: Value) -> impl Future<Output = Result<Removed, DataError>> + Send;
    /// Delete every row of the entity, soft-delete setting notwithstanding.
    fn clear(&self) -> impl Future<Output = Result<u64, DataError>> + Send;

    /// Plain-object view of a record.
    fn entity_to_object(&self, record: Record) -> Record {
        record
    }

    /// Hook applied to a record before it is saved.
    fn before_save_transform_id(&self, record: Record, _id_field: &str) -> Record {
        record
    }

    /// Hook applied to a record after it is read.
    fn after_retrieve_transform_id(&self, record: Record, _id_field: &str) -> Record {
        record
    }
}
