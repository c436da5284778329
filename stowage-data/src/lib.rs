pub mod descriptor;
pub mod entity;
pub mod error;
pub mod filter;
pub mod params;
pub mod query;
pub mod record;
pub mod repository;
pub mod sort;

pub use descriptor::{build_descriptor, QueryDescriptor};
pub use entity::{ColumnDef, ColumnType, Entity, EntitySchema};
pub use error::DataError;
pub use filter::{Condition, Filter};
pub use params::{FindParams, NumericParam, RelationsParam};
pub use query::{Dialect, IdentifierPolicy, QueryBuilder, QueryError};
pub use record::{
    DeleteResult, InsertMode, Record, Removed, ServiceSettings, UpdatePatch, UpdateResult,
};
pub use repository::StorageAdapter;
pub use sort::{parse_sort, SortDirection, SortOrder, SortSpec};

#[doc(hidden)]
pub use serde_json;

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        record, ColumnDef, ColumnType, DataError, Entity, EntitySchema, Filter, FindParams,
        Record, ServiceSettings, SortDirection, StorageAdapter, UpdatePatch,
    };
}
