use std::sync::Arc;

use serde_json::Value;
use sqlx::AnyPool;
use stowage_data::query::Statement;
use stowage_data::{DataError, Dialect, EntitySchema, IdentifierPolicy, QueryBuilder, Record};

use crate::convert;
use crate::error::{SqlxErrorExt, SqlxResult};
use crate::row::{bind_values, decode_row};
use crate::schema::create_table_sql;

/// Repository handle for one entity: pool, bound schema and SQL dialect.
///
/// Cheap to clone; clones share the pool.
///
/// # Example
///
/// ```ignore
/// let repo = SqlxRepository::new(pool.clone(), Arc::new(schema), Dialect::Sqlite);
/// let stmt = repo.builder().where_eq("id", 1).build_select(&["*"])?;
/// let rows = repo.fetch_all(stmt).await?;
/// ```
#[derive(Clone)]
pub struct SqlxRepository {
    pool: AnyPool,
    schema: Arc<EntitySchema>,
    dialect: Dialect,
}

impl SqlxRepository {
    pub fn new(pool: AnyPool, schema: Arc<EntitySchema>, dialect: Dialect) -> Self {
        Self {
            pool,
            schema,
            dialect,
        }
    }

    /// Get the underlying pool reference.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Builder over the entity table with quoted identifiers.
    pub fn builder(&self) -> QueryBuilder {
        QueryBuilder::new_with_dialect(self.schema.table_name(), self.dialect)
            .identifier_policy(IdentifierPolicy::Quote)
    }

    /// Create the entity table if it does not exist.
    pub async fn synchronize(&self) -> SqlxResult<()> {
        let sql = create_table_sql(&self.schema, self.dialect);
        tracing::debug!(%sql, "synchronizing schema");
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        Ok(())
    }

    pub async fn fetch_all(&self, (sql, params): Statement) -> SqlxResult<Vec<Record>> {
        tracing::debug!(%sql, binds = params.len(), "fetch");
        let rows = bind_values(sqlx::query(&sql), &params)
            .fetch_all(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        rows.iter().map(|row| decode_row(&self.schema, row)).collect()
    }

    pub async fn fetch_optional(&self, (sql, params): Statement) -> SqlxResult<Option<Record>> {
        tracing::debug!(%sql, binds = params.len(), "fetch one");
        let row = bind_values(sqlx::query(&sql), &params)
            .fetch_optional(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        row.map(|row| decode_row(&self.schema, &row)).transpose()
    }

    pub async fn fetch_count(&self, (sql, params): Statement) -> SqlxResult<u64> {
        use sqlx::Row;

        tracing::debug!(%sql, binds = params.len(), "count");
        let row = bind_values(sqlx::query(&sql), &params)
            .fetch_one(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        let count: i64 = row.try_get(0).map_err(SqlxErrorExt::into_data_error)?;
        u64::try_from(count).map_err(|_| DataError::Decode(format!("negative count {count}")))
    }

    /// Run a statement, returning the number of affected rows.
    pub async fn execute(&self, (sql, params): Statement) -> SqlxResult<u64> {
        tracing::debug!(%sql, binds = params.len(), "execute");
        let result = bind_values(sqlx::query(&sql), &params)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        Ok(result.rows_affected())
    }

    /// Fetch the row whose primary key equals `id`, deleted or not.
    pub async fn fetch_by_id(&self, id: Value) -> SqlxResult<Option<Record>> {
        let stmt = self
            .builder()
            .where_eq(self.schema.id_column(), id)
            .build_select(&["*"])?;
        self.fetch_optional(stmt).await
    }

    /// Insert one row of storage-form values and read it back.
    pub async fn insert_row(&self, values: Vec<(String, Value)>) -> SqlxResult<Record> {
        let values: Vec<(&str, Value)> = values.iter().map(|(c, v)| (c.as_str(), v.clone())).collect();

        if self.dialect.supports_returning() {
            let stmt = self.builder().build_insert(&values, Some(&["*"]))?;
            return self
                .fetch_optional(stmt)
                .await?
                .ok_or_else(|| DataError::Decode("insert returned no row".into()));
        }

        let (sql, params) = self.builder().build_insert(&values, None)?;
        tracing::debug!(%sql, binds = params.len(), "insert");
        let result = bind_values(sqlx::query(&sql), &params)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;

        let id_column = self.schema.id_column();
        let id = match values.iter().find(|(c, _)| *c == id_column) {
            Some((_, id)) if !id.is_null() => id.clone(),
            _ => result
                .last_insert_id()
                .map(Value::from)
                .ok_or_else(|| DataError::Decode("backend reported no insert id".into()))?,
        };
        self.fetch_by_id(convert::coerce_id(&self.schema, &id)?)
            .await?
            .ok_or_else(|| DataError::Decode(format!("inserted row {id} not found")))
    }
}

impl std::fmt::Debug for SqlxRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlxRepository")
            .field("table", &self.schema.table_name())
            .field("dialect", &self.dialect)
            .finish()
    }
}
