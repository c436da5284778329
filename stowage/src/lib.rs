//! Stowage: a generic storage adapter for relational entities.
//!
//! This facade crate re-exports the Stowage sub-crates through a single
//! dependency with feature flags. Import everything you need with:
//!
//! ```ignore
//! use stowage::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature     | Default | Crate                          |
//! |-------------|---------|--------------------------------|
//! | `data-sqlx` | via `sqlite` | `stowage-data-sqlx`       |
//! | `sqlite`    | **yes** | `stowage-data-sqlx/sqlite`     |
//! | `postgres`  | no      | `stowage-data-sqlx/postgres`   |
//! | `mysql`     | no      | `stowage-data-sqlx/mysql`      |
//! | `full`      | no      | All drivers                    |
//!
//! `stowage-core` (configuration, tracing) and `stowage-data` (schema, query
//! normalizer, `StorageAdapter`) are always available.

pub use stowage_core;
pub use stowage_data;

#[cfg(feature = "data-sqlx")]
pub use stowage_data_sqlx;

// Re-export the core at the top level for convenience.
pub use stowage_core::{init_tracing, ConfigProperties, StowageConfig};
pub use stowage_data::*;

#[cfg(feature = "data-sqlx")]
pub use stowage_data_sqlx::{DataSourceOptions, Driver, SqlxAdapter};

pub mod prelude {
    //! Re-exports of the most commonly used types.
    pub use stowage_core::{init_tracing, ConfigProperties, StowageConfig};
    pub use stowage_data::prelude::*;
    pub use stowage_data::{InsertMode, Removed};

    #[cfg(feature = "data-sqlx")]
    pub use stowage_data_sqlx::{DataSourceOptions, SqlxAdapter};
}
