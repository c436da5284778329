use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use futures_util::future::join_all;
use serde_json::Value;
use sqlx::any::AnyPoolOptions;
use stowage_data::{
    build_descriptor, Condition, DataError, DeleteResult, EntitySchema, Filter, FindParams, InsertMode,
    QueryBuilder, QueryDescriptor, Record, Removed, ServiceSettings, StorageAdapter, UpdatePatch,
    UpdateResult,
};
use tokio::sync::RwLock;

use crate::convert;
use crate::error::{SqlxErrorExt, SqlxResult};
use crate::options::DataSourceOptions;
use crate::repository::SqlxRepository;

/// [`StorageAdapter`] over an `sqlx::AnyPool`.
///
/// ```ignore
/// let adapter = SqlxAdapter::new(DataSourceOptions::sqlite_memory());
/// adapter.init(posts_schema(), ServiceSettings::soft_delete())?;
/// adapter.connect().await?;
///
/// let post = adapter.insert(record! { "title" => "Hello", "votes" => 0 }).await?;
/// let top = adapter
///     .find(Some(&FindParams::new().sort("-votes").limit(10)))
///     .await?;
///
/// adapter.disconnect().await?;
/// ```
pub struct SqlxAdapter {
    options: DataSourceOptions,
    schema: OnceLock<Arc<EntitySchema>>,
    use_soft_delete: AtomicBool,
    session: RwLock<Option<SqlxRepository>>,
}

impl SqlxAdapter {
    /// Store the connection options. Nothing is opened until `connect`.
    pub fn new(options: DataSourceOptions) -> Self {
        Self {
            options,
            schema: OnceLock::new(),
            use_soft_delete: AtomicBool::new(false),
            session: RwLock::new(None),
        }
    }

    pub fn options(&self) -> &DataSourceOptions {
        &self.options
    }

    /// The bound entity definition, once `init` has run.
    pub fn schema(&self) -> Option<&EntitySchema> {
        self.schema.get().map(Arc::as_ref)
    }

    pub fn use_soft_delete(&self) -> bool {
        self.use_soft_delete.load(Ordering::SeqCst)
    }

    /// Switch removal between soft and hard delete. Takes effect on the next call.
    pub fn set_use_soft_delete(&self, enabled: bool) {
        self.use_soft_delete.store(enabled, Ordering::SeqCst);
    }

    pub async fn is_connected(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Current repository handle; the lock is released before any query runs.
    async fn repository(&self) -> SqlxResult<SqlxRepository> {
        self.session
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or(DataError::NotConnected)
    }

    /// Name of the delete-date column when removals are soft.
    fn soft_delete_column(&self, schema: &EntitySchema) -> SqlxResult<Option<String>> {
        if !self.use_soft_delete() {
            return Ok(None);
        }
        match schema.delete_date() {
            Some(column) => Ok(Some(column.to_string())),
            None => Err(DataError::config(format!(
                "soft delete is enabled but '{}' has no delete-date column",
                schema.table_name()
            ))),
        }
    }

    /// Builder with the descriptor's filter and the soft-delete scope applied.
    fn scoped(
        repo: &SqlxRepository,
        filter: &Filter,
        with_deleted: bool,
    ) -> SqlxResult<QueryBuilder> {
        let schema = repo.schema();
        let mut qb = repo
            .builder()
            .filter(&convert::coerce_filter(schema, filter)?);
        if let (Some(column), false) = (schema.delete_date(), with_deleted) {
            qb = qb.where_null(column);
        }
        Ok(qb)
    }

    fn select(repo: &SqlxRepository, descriptor: &QueryDescriptor) -> SqlxResult<QueryBuilder> {
        let mut qb = Self::scoped(repo, &descriptor.filter, descriptor.with_deleted)?;
        if let Some(order) = &descriptor.order {
            convert::check_order(repo.schema(), order)?;
            qb = qb.order(order);
        }
        if let Some(relations) = descriptor.relations.as_ref().filter(|r| !r.is_empty()) {
            tracing::warn!(?relations, "relation loading is not supported, ignoring");
        }
        if let Some(skip) = descriptor.skip {
            qb = qb.offset(skip);
        }
        if let Some(take) = descriptor.take {
            qb = qb.limit(take);
        }
        Ok(qb)
    }

    fn id_filter(schema: &EntitySchema, id: Value) -> Filter {
        Filter::new().eq(schema.id_column(), id)
    }

    fn retrieved(&self, schema: &EntitySchema, record: Record) -> Record {
        self.after_retrieve_transform_id(record, schema.id_column())
    }

    /// Insert every record, concurrently or one at a time.
    ///
    /// No atomicity: rows inserted before a failure stay. On any failure the outcome
    /// of every record is reported through [`DataError::PartialInsert`].
    pub async fn insert_many_with(
        &self,
        records: Vec<Record>,
        mode: InsertMode,
    ) -> SqlxResult<Vec<Record>> {
        let total = records.len();
        let mut inserted = Vec::with_capacity(total);
        let mut failures = Vec::new();

        match mode {
            InsertMode::Concurrent => {
                let outcomes = join_all(records.into_iter().map(|r| self.insert(r))).await;
                for (index, outcome) in outcomes.into_iter().enumerate() {
                    match outcome {
                        Ok(record) => inserted.push(record),
                        Err(err) => failures.push((index, err)),
                    }
                }
            }
            InsertMode::Sequential => {
                for (index, record) in records.into_iter().enumerate() {
                    match self.insert(record).await {
                        Ok(record) => inserted.push(record),
                        Err(err) => {
                            failures.push((index, err));
                            break;
                        }
                    }
                }
            }
        }

        if failures.is_empty() {
            tracing::debug!(count = total, ?mode, "batch inserted");
            return Ok(inserted);
        }
        tracing::warn!(
            inserted = inserted.len(),
            failed = failures.len(),
            total,
            ?mode,
            "batch insert partially failed"
        );
        Err(DataError::PartialInsert { inserted, failures })
    }

    /// Bring a soft-deleted row back.
    pub async fn restore_by_id(&self, id: Value) -> SqlxResult<UpdateResult> {
        let repo = self.repository().await?;
        let schema = repo.schema();
        let column = schema.delete_date().ok_or_else(|| {
            DataError::config(format!(
                "'{}' has no delete-date column to restore",
                schema.table_name()
            ))
        })?;

        let stmt = repo
            .builder()
            .where_eq(schema.id_column(), convert::coerce_id(schema, &id)?)
            .where_not_null(column)
            .build_update(&[(column, Value::Null)])?;
        let affected = repo.execute(stmt).await?;
        tracing::debug!(%id, affected, "restore by id");
        Ok(UpdateResult { affected })
    }
}

impl StorageAdapter for SqlxAdapter {
    fn init(&self, schema: EntitySchema, settings: ServiceSettings) -> Result<(), DataError> {
        schema.validate()?;
        if settings.use_soft_delete && schema.delete_date().is_none() {
            return Err(DataError::config(format!(
                "soft delete requires a delete-date column on '{}'",
                schema.table_name()
            )));
        }

        let table = schema.table_name().to_string();
        self.schema
            .set(Arc::new(schema))
            .map_err(|_| DataError::config("adapter is already bound to an entity"))?;
        self.set_use_soft_delete(settings.use_soft_delete);
        tracing::info!(%table, soft_delete = settings.use_soft_delete, "entity bound");
        Ok(())
    }

    async fn connect(&self) -> Result<(), DataError> {
        let schema = self
            .schema
            .get()
            .cloned()
            .ok_or_else(|| DataError::config("connect called before init"))?;

        let mut session = self.session.write().await;
        if session.is_some() {
            return Err(DataError::AlreadyConnected);
        }

        let url = self.options.connection_url()?;
        let mut max_connections = self.options.max_connections.max(1);
        if self.options.is_memory() && max_connections > 1 {
            tracing::warn!(max_connections, "in-memory database, using a single connection");
            max_connections = 1;
        }

        sqlx::any::install_default_drivers();
        let mut pool_options = AnyPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(self.options.acquire_timeout());
        if self.options.is_memory() {
            // Closing the last connection drops an in-memory database.
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options
            .connect(&url)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;

        let repository = SqlxRepository::new(pool, schema, self.options.dialect());
        // Schema sync is forced on for the bound entity.
        if let Err(err) = repository.synchronize().await {
            repository.pool().close().await;
            return Err(err);
        }

        tracing::info!(
            driver = ?self.options.driver,
            table = repository.schema().table_name(),
            max_connections,
            "connected"
        );
        *session = Some(repository);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), DataError> {
        let repository = self.session.write().await.take();
        if let Some(repository) = repository {
            repository.pool().close().await;
            tracing::info!(table = repository.schema().table_name(), "disconnected");
        }
        Ok(())
    }

    async fn find(&self, params: Option<&FindParams>) -> Result<Vec<Record>, DataError> {
        let repo = self.repository().await?;
        let descriptor = build_descriptor(params);
        let stmt = Self::select(&repo, &descriptor)?.build_select(&["*"])?;
        let records = repo.fetch_all(stmt).await?;
        Ok(records
            .into_iter()
            .map(|r| self.retrieved(repo.schema(), r))
            .collect())
    }

    async fn count(&self, params: Option<&FindParams>) -> Result<u64, DataError> {
        let repo = self.repository().await?;
        let descriptor = build_descriptor(params);
        let stmt = Self::scoped(&repo, &descriptor.filter, descriptor.with_deleted)?.build_count()?;
        repo.fetch_count(stmt).await
    }

    async fn find_one(&self, params: Option<&FindParams>) -> Result<Option<Record>, DataError> {
        let repo = self.repository().await?;
        let descriptor = build_descriptor(params).with_take(1);
        let stmt = Self::select(&repo, &descriptor)?.build_select(&["*"])?;
        let record = repo.fetch_optional(stmt).await?;
        Ok(record.map(|r| self.retrieved(repo.schema(), r)))
    }

    async fn find_by_id(&self, id: Value) -> Result<Option<Record>, DataError> {
        let repo = self.repository().await?;
        let filter = Self::id_filter(repo.schema(), id);
        let stmt = Self::scoped(&repo, &filter, false)?.build_select(&["*"])?;
        let record = repo.fetch_optional(stmt).await?;
        Ok(record.map(|r| self.retrieved(repo.schema(), r)))
    }

    async fn find_by_ids(&self, ids: &[Value]) -> Result<Vec<Record>, DataError> {
        let repo = self.repository().await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = Filter::new().with(repo.schema().id_column(), Condition::In(ids.to_vec()));
        let stmt = Self::scoped(&repo, &filter, false)?.build_select(&["*"])?;
        let records = repo.fetch_all(stmt).await?;
        Ok(records
            .into_iter()
            .map(|r| self.retrieved(repo.schema(), r))
            .collect())
    }

    async fn insert(&self, record: Record) -> Result<Record, DataError> {
        let repo = self.repository().await?;
        let schema = repo.schema();
        let record = self.before_save_transform_id(self.entity_to_object(record), schema.id_column());
        let values = convert::coerce_record(schema, &record, true)?;
        let saved = repo.insert_row(values).await?;
        tracing::debug!(table = schema.table_name(), id = ?saved.get(schema.id_column()), "inserted");
        Ok(self.retrieved(schema, saved))
    }

    async fn insert_many(&self, records: Vec<Record>) -> Result<Vec<Record>, DataError> {
        self.insert_many_with(records, InsertMode::Concurrent).await
    }

    async fn update_many(&self, filter: &Filter, patch: Record) -> Result<UpdateResult, DataError> {
        let repo = self.repository().await?;
        if filter.is_empty() {
            return Err(DataError::invalid_query("update_many requires a non-empty filter"));
        }
        let schema = repo.schema();
        let assignments = convert::coerce_patch(schema, &patch)?;
        let assignments: Vec<(&str, Value)> = assignments
            .iter()
            .map(|(c, v)| (c.as_str(), v.clone()))
            .collect();
        let stmt = repo
            .builder()
            .filter(&convert::coerce_filter(schema, filter)?)
            .build_update(&assignments)?;
        let affected = repo.execute(stmt).await?;
        Ok(UpdateResult { affected })
    }

    async fn update_by_id(&self, id: Value, patch: UpdatePatch) -> Result<Option<Record>, DataError> {
        let repo = self.repository().await?;
        let schema = repo.schema();
        let id_column = schema.id_column();
        if !patch.set.is_empty() {
            convert::coerce_patch(schema, &patch.set)?;
        }

        let Some(mut record) = self.find_by_id(id.clone()).await? else {
            return Ok(None);
        };

        for (field, value) in patch.set {
            record.insert(field, value);
        }
        let record = self.before_save_transform_id(record, id_column);

        // Full save of every non-key column, like an entity `save`.
        let values = convert::coerce_record(schema, &record, false)?;
        let assignments: Vec<(&str, Value)> = values
            .iter()
            .filter(|(c, _)| c != id_column)
            .map(|(c, v)| (c.as_str(), v.clone()))
            .collect();
        if assignments.is_empty() {
            return Ok(Some(record));
        }
        let stmt = repo
            .builder()
            .where_eq(id_column, convert::coerce_id(schema, &id)?)
            .build_update(&assignments)?;
        repo.execute(stmt).await?;

        let saved = repo
            .fetch_by_id(convert::coerce_id(schema, &id)?)
            .await?
            .unwrap_or(record);
        Ok(Some(self.retrieved(schema, saved)))
    }

    async fn remove_many(&self, filter: &Filter) -> Result<DeleteResult, DataError> {
        let repo = self.repository().await?;
        if filter.is_empty() {
            return Err(DataError::invalid_query(
                "remove_many requires a non-empty filter, use clear() to delete everything",
            ));
        }
        let schema = repo.schema();
        let filter = convert::coerce_filter(schema, filter)?;
        let stmt = match self.soft_delete_column(schema)? {
            Some(column) => repo
                .builder()
                .filter(&filter)
                .where_null(&column)
                .build_update(&[(column.as_str(), convert::now_timestamp())])?,
            None => repo.builder().filter(&filter).build_delete()?,
        };
        let affected = repo.execute(stmt).await?;
        tracing::debug!(affected, soft = self.use_soft_delete(), "remove many");
        Ok(DeleteResult { affected })
    }

    async fn remove_by_id(&self, id: Value) -> Result<Removed, DataError> {
        let repo = self.repository().await?;
        let schema = repo.schema();
        let soft_column = self.soft_delete_column(schema)?;
        // An id the key column cannot hold matches no row.
        let Ok(key) = convert::coerce_id(schema, &id) else {
            tracing::debug!(%id, "remove by id: id does not fit the key column");
            return Ok(Removed { id });
        };
        let stmt = match soft_column {
            Some(column) => repo
                .builder()
                .where_eq(schema.id_column(), key)
                .where_null(&column)
                .build_update(&[(column.as_str(), convert::now_timestamp())])?,
            None => repo
                .builder()
                .where_eq(schema.id_column(), key)
                .build_delete()?,
        };
        let affected = repo.execute(stmt).await?;
        tracing::debug!(%id, affected, soft = self.use_soft_delete(), "remove by id");
        Ok(Removed { id })
    }

    async fn clear(&self) -> Result<u64, DataError> {
        let repo = self.repository().await?;
        let affected = repo.execute(repo.builder().build_delete()?).await?;
        tracing::info!(table = repo.schema().table_name(), affected, "cleared");
        Ok(affected)
    }
}

impl std::fmt::Debug for SqlxAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlxAdapter")
            .field("driver", &self.options.driver)
            .field("table", &self.schema().map(EntitySchema::table_name))
            .field("use_soft_delete", &self.use_soft_delete())
            .finish()
    }
}
