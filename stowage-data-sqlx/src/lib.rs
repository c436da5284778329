//! # stowage-data-sqlx: SQLx backend for the Stowage storage adapter
//!
//! This crate provides the [SQLx](https://github.com/launchbadge/sqlx)-backed
//! implementation of [`stowage_data::StorageAdapter`]. It depends on
//! [`stowage-data`] for the entity schema, query normalizer and query builder,
//! and adds connection handling, schema sync and row mapping on top of
//! `sqlx::AnyPool`.
//!
//! # What's in this crate
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SqlxAdapter`] | The adapter: lifecycle (`init`/`connect`/`disconnect`) and CRUD |
//! | [`DataSourceOptions`] | Connection options, loadable from the `stowage.datasource` config section |
//! | [`SqlxRepository`] | Repository handle holding the pool, bound schema and dialect |
//! | [`SqlxErrorExt`] | Extension trait to convert `sqlx::Error` → `DataError` (`.into_data_error()`) |
//! | [`SqlxResult<T>`] | Type alias for `Result<T, DataError>` |
//!
//! # Feature flags
//!
//! The pool uses sqlx's `Any` driver; each feature installs one backend:
//!
//! | Feature    | Default | Driver |
//! |------------|---------|--------|
//! | `sqlite`   | **yes** | SQLite via `sqlx/sqlite` |
//! | `postgres` | no      | PostgreSQL via `sqlx/postgres` |
//! | `mysql`    | no      | MySQL via `sqlx/mysql` |
//!
//! # Quick start
//!
//! ```ignore
//! use stowage_data::prelude::*;
//! use stowage_data_sqlx::{DataSourceOptions, SqlxAdapter};
//!
//! let adapter = SqlxAdapter::new(DataSourceOptions::sqlite_memory());
//! adapter.init(
//!     EntitySchema::new("posts")
//!         .column(ColumnDef::primary_generated("id"))
//!         .column(ColumnDef::new("title", ColumnType::Text).not_null())
//!         .delete_date_column("deleted_at"),
//!     ServiceSettings::soft_delete(),
//! )?;
//! adapter.connect().await?; // creates "posts" if missing
//!
//! let post = adapter.insert(record! { "title" => "Hello" }).await?;
//! adapter.remove_by_id(post["id"].clone()).await?; // sets deleted_at
//! ```
//!
//! # Soft delete
//!
//! With `use_soft_delete`, removals stamp the delete-date column instead of
//! deleting rows, and every read skips stamped rows unless
//! [`FindParams::with_deleted`](stowage_data::FindParams::with_deleted) is set.
//! The flag is read on each call and can be flipped with
//! [`SqlxAdapter::set_use_soft_delete`]. `clear()` always deletes.
//!
//! # Error bridging
//!
//! Due to Rust's orphan rules, `From<sqlx::Error> for DataError` can't be
//! implemented here. Use the [`SqlxErrorExt`] trait instead:
//!
//! ```ignore
//! use stowage_data_sqlx::SqlxErrorExt;
//!
//! sqlx::query("SELECT 1")
//!     .execute(repo.pool())
//!     .await
//!     .map_err(|e| e.into_data_error())?;
//! ```

pub mod adapter;
pub mod convert;
pub mod error;
pub mod options;
pub mod repository;
pub mod row;
pub mod schema;

pub use adapter::SqlxAdapter;
pub use error::{SqlxErrorExt, SqlxResult};
pub use options::{DataSourceOptions, Driver};
pub use repository::SqlxRepository;

/// Re-exports of the most commonly used types from both `stowage-data` and this crate.
pub mod prelude {
    pub use crate::{DataSourceOptions, SqlxAdapter, SqlxErrorExt, SqlxRepository};
    pub use stowage_data::prelude::*;
}
