//! Table creation for the bound entity.
//!
//! This is a create-if-missing of one table, not a migration engine: an existing
//! table is left as is even when its columns differ.

use stowage_data::query::quote_identifier;
use stowage_data::{ColumnDef, ColumnType, Dialect, EntitySchema};

fn sql_type(column_type: ColumnType, dialect: Dialect) -> &'static str {
    match (column_type, dialect) {
        (ColumnType::Integer, Dialect::Sqlite | Dialect::Generic) => "INTEGER",
        (ColumnType::Integer, Dialect::Postgres | Dialect::MySql) => "BIGINT",
        (ColumnType::Real, Dialect::Postgres) => "DOUBLE PRECISION",
        (ColumnType::Real, Dialect::MySql) => "DOUBLE",
        (ColumnType::Real, Dialect::Sqlite | Dialect::Generic) => "REAL",
        // MySQL cannot index or key unbounded TEXT
        (ColumnType::Text, Dialect::MySql) => "VARCHAR(255)",
        (ColumnType::Timestamp, Dialect::MySql) => "VARCHAR(32)",
        (ColumnType::Text | ColumnType::Timestamp, _) => "TEXT",
        // The Any driver cannot decode SQLite's BOOLEAN affinity
        (ColumnType::Boolean, Dialect::Sqlite | Dialect::Generic) => "INTEGER",
        (ColumnType::Boolean, Dialect::Postgres | Dialect::MySql) => "BOOLEAN",
        (ColumnType::Json, _) => "TEXT",
    }
}

fn column_sql(column: &ColumnDef, dialect: Dialect) -> String {
    let name = quote_identifier(&column.name, dialect, false);
    if column.generated {
        let key = match dialect {
            Dialect::Postgres => "BIGSERIAL PRIMARY KEY",
            Dialect::MySql => "BIGINT AUTO_INCREMENT PRIMARY KEY",
            Dialect::Sqlite | Dialect::Generic => "INTEGER PRIMARY KEY AUTOINCREMENT",
        };
        return format!("{name} {key}");
    }

    let mut sql = format!("{name} {}", sql_type(column.column_type, dialect));
    if column.primary {
        sql.push_str(" PRIMARY KEY");
    }
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if column.unique && !column.primary {
        sql.push_str(" UNIQUE");
    }
    sql
}

/// `CREATE TABLE IF NOT EXISTS` for `schema`. Identifiers must already be validated.
pub fn create_table_sql(schema: &EntitySchema, dialect: Dialect) -> String {
    let columns: Vec<_> = schema
        .columns()
        .iter()
        .map(|c| column_sql(c, dialect))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_identifier(schema.table_name(), dialect, false),
        columns.join(", ")
    )
}
