use crate::record::Record;

/// Errors that can occur in the data layer.
#[derive(Debug)]
pub enum DataError {
    /// Invalid entity definition or adapter set-up, raised before any backend call.
    Config(String),
    /// An operation was issued before `connect` or after `disconnect`.
    NotConnected,
    /// `connect` was called while a connection is already open.
    AlreadyConnected,
    /// The request cannot be rendered into a statement (bad identifier, empty patch, ...).
    InvalidQuery(String),
    /// A row or record could not be converted.
    Decode(String),
    /// Any failure reported by the backend store, unchanged.
    Database(Box<dyn std::error::Error + Send + Sync>),
    /// Some inserts of a batch failed. Successful rows are not rolled back.
    PartialInsert {
        inserted: Vec<Record>,
        failures: Vec<(usize, DataError)>,
    },
}

impl DataError {
    /// Construct a `Database` variant from any error type.
    ///
    /// Used by backend crates (e.g. `stowage-data-sqlx`) to wrap driver-specific errors.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }

    pub fn config(msg: impl Into<String>) -> Self {
        DataError::Config(msg.into())
    }

    pub fn invalid_query(msg: impl Into<String>) -> Self {
        DataError::InvalidQuery(msg.into())
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Config(msg) => write!(f, "Configuration error: {msg}"),
            DataError::NotConnected => write!(f, "Adapter is not connected"),
            DataError::AlreadyConnected => write!(f, "Adapter is already connected"),
            DataError::InvalidQuery(msg) => write!(f, "Invalid query: {msg}"),
            DataError::Decode(msg) => write!(f, "Decode error: {msg}"),
            DataError::Database(err) => write!(f, "Database error: {err}"),
            DataError::PartialInsert { inserted, failures } => {
                write!(
                    f,
                    "Batch insert partially failed: {} inserted, {} failed",
                    inserted.len(),
                    failures.len()
                )?;
                if let Some((index, err)) = failures.first() {
                    write!(f, " (first failure at #{index}: {err})")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Database(err) => Some(err.as_ref()),
            DataError::PartialInsert { failures, .. } => failures
                .first()
                .map(|(_, err)| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Decode(err.to_string())
    }
}
