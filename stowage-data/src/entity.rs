use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::DataError;
use crate::query::is_valid_identifier;
use crate::record::Record;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Boolean,
    /// RFC 3339 text.
    Timestamp,
    /// JSON document stored as text.
    Json,
}

/// One column of an [`EntitySchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub unique: bool,
    pub primary: bool,
    /// Value assigned by the backend on insert (auto-increment key).
    pub generated: bool,
}

impl ColumnDef {
    /// A nullable, non-unique column.
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            nullable: true,
            unique: false,
            primary: false,
            generated: false,
        }
    }

    /// An auto-incremented integer primary key.
    pub fn primary_generated(name: &str) -> Self {
        Self::new(name, ColumnType::Integer).primary().generated()
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.nullable = false;
        self
    }

    pub fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Entity definition bound to an adapter: table, columns and soft-delete column.
///
/// ```ignore
/// let posts = EntitySchema::new("posts")
///     .column(ColumnDef::primary_generated("id"))
///     .column(ColumnDef::new("title", ColumnType::Text).not_null())
///     .column(ColumnDef::new("votes", ColumnType::Integer))
///     .delete_date_column("deleted_at");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    table: String,
    columns: Vec<ColumnDef>,
    delete_date_column: Option<String>,
}

impl EntitySchema {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            delete_date_column: None,
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Declare the column that marks soft-deleted rows.
    ///
    /// Adds a nullable `Timestamp` column of that name unless one is already declared.
    pub fn delete_date_column(mut self, name: &str) -> Self {
        if !self.columns.iter().any(|c| c.name == name) {
            self.columns.push(ColumnDef::new(name, ColumnType::Timestamp));
        }
        self.delete_date_column = Some(name.to_string());
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_column(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.primary)
    }

    /// Name of the primary-key column, `"id"` if none is declared.
    pub fn id_column(&self) -> &str {
        self.primary_column().map(|c| c.name.as_str()).unwrap_or("id")
    }

    pub fn delete_date(&self) -> Option<&str> {
        self.delete_date_column.as_deref()
    }

    /// Check that the definition is a usable model.
    pub fn validate(&self) -> Result<(), DataError> {
        if !is_valid_identifier(&self.table, false) {
            return Err(DataError::config(format!(
                "invalid table name '{}'",
                self.table
            )));
        }
        if self.columns.is_empty() {
            return Err(DataError::config(format!(
                "entity '{}' declares no columns",
                self.table
            )));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !is_valid_identifier(&column.name, false) || column.name.contains('.') {
                return Err(DataError::config(format!(
                    "invalid column name '{}' on '{}'",
                    column.name, self.table
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(DataError::config(format!(
                    "duplicate column '{}' on '{}'",
                    column.name, self.table
                )));
            }
            if column.generated && (!column.primary || column.column_type != ColumnType::Integer) {
                return Err(DataError::config(format!(
                    "only an integer primary key can be generated ('{}')",
                    column.name
                )));
            }
        }

        match self.columns.iter().filter(|c| c.primary).count() {
            1 => {}
            0 => {
                return Err(DataError::config(format!(
                    "entity '{}' has no primary column",
                    self.table
                )))
            }
            n => {
                return Err(DataError::config(format!(
                    "entity '{}' has {n} primary columns, expected one",
                    self.table
                )))
            }
        }

        if let Some(name) = &self.delete_date_column {
            match self.find_column(name) {
                Some(c) if c.nullable && !c.primary => {}
                _ => {
                    return Err(DataError::config(format!(
                        "delete-date column '{name}' must be a nullable, non-key column"
                    )))
                }
            }
        }
        Ok(())
    }
}

/// A Rust type persisted through a [`StorageAdapter`](crate::StorageAdapter).
///
/// Records travel through the adapter as JSON objects; `Entity` gives a typed view
/// over them via serde.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Post { id: Option<i64>, title: String, votes: i64 }
///
/// impl Entity for Post {
///     fn schema() -> EntitySchema {
///         EntitySchema::new("posts")
///             .column(ColumnDef::primary_generated("id"))
///             .column(ColumnDef::new("title", ColumnType::Text).not_null())
///             .column(ColumnDef::new("votes", ColumnType::Integer))
///     }
/// }
///
/// let saved = Post::from_record(adapter.insert(post.to_record()?).await?)?;
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    fn schema() -> EntitySchema;

    fn to_record(&self) -> Result<Record, DataError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(DataError::Decode(format!(
                "entity serialized to {other}, expected an object"
            ))),
        }
    }

    fn from_record(record: Record) -> Result<Self, DataError> {
        Ok(serde_json::from_value(serde_json::Value::Object(record))?)
    }
}
