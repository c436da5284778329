use serde_json::{Number, Value};
use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, Column, Row};
use stowage_data::{ColumnType, DataError, EntitySchema, Record};

/// Bind storage-form values onto a query, in placeholder order.
///
/// Values come out of `convert`, so arrays and objects only appear for JSON columns
/// and are bound as text.
pub fn bind_values<'q>(
    mut query: Query<'q, Any, AnyArguments<'q>>,
    values: &[Value],
) -> Query<'q, Any, AnyArguments<'q>> {
    for value in values {
        query = match value {
            Value::Null => query.bind(Option::<String>::None),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => query.bind(s.clone()),
            Value::Array(_) | Value::Object(_) => query.bind(value.to_string()),
        };
    }
    query
}

/// Decode a row into a record keyed by column name.
///
/// Declared columns decode per their type; anything else is read best-effort.
pub fn decode_row(schema: &EntitySchema, row: &AnyRow) -> Result<Record, DataError> {
    let mut record = Record::new();
    for column in row.columns() {
        let name = column.name();
        let index = column.ordinal();
        let value = match schema.find_column(name) {
            Some(def) => decode_typed(row, index, def.column_type),
            None => decode_untyped(row, index),
        }
        .map_err(|e| DataError::Decode(format!("column '{name}': {e}")))?;
        record.insert(name.to_string(), value);
    }
    Ok(record)
}

fn decode_typed(row: &AnyRow, index: usize, column_type: ColumnType) -> Result<Value, sqlx::Error> {
    match column_type {
        ColumnType::Integer => match row.try_get::<Option<i64>, _>(index) {
            Ok(v) => Ok(v.map(Value::from).unwrap_or(Value::Null)),
            Err(_) => row
                .try_get::<Option<i32>, _>(index)
                .map(|v| v.map(Value::from).unwrap_or(Value::Null)),
        },
        ColumnType::Real => match row.try_get::<Option<f64>, _>(index) {
            Ok(v) => Ok(v.map(float).unwrap_or(Value::Null)),
            // SQLite hands back integral REAL values as integers
            Err(_) => row
                .try_get::<Option<i64>, _>(index)
                .map(|v| v.map(|i| float(i as f64)).unwrap_or(Value::Null)),
        },
        ColumnType::Boolean => match row.try_get::<Option<bool>, _>(index) {
            Ok(v) => Ok(v.map(Value::Bool).unwrap_or(Value::Null)),
            Err(_) => row
                .try_get::<Option<i64>, _>(index)
                .map(|v| v.map(|i| Value::Bool(i != 0)).unwrap_or(Value::Null)),
        },
        ColumnType::Text | ColumnType::Timestamp => row
            .try_get::<Option<String>, _>(index)
            .map(|v| v.map(Value::String).unwrap_or(Value::Null)),
        ColumnType::Json => row.try_get::<Option<String>, _>(index).map(|v| match v {
            Some(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
            None => Value::Null,
        }),
    }
}

fn decode_untyped(row: &AnyRow, index: usize) -> Result<Value, sqlx::Error> {
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return Ok(v.map(Value::from).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return Ok(v.map(float).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return Ok(v.map(Value::Bool).unwrap_or(Value::Null));
    }
    row.try_get::<Option<String>, _>(index)
        .map(|v| v.map(Value::String).unwrap_or(Value::Null))
}

fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}
