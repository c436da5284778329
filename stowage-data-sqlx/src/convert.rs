//! Coercion of caller-supplied JSON values into the storage form of each column.
//!
//! | Column      | Accepted input                         | Stored as        |
//! |-------------|----------------------------------------|------------------|
//! | `Integer`   | integral number, numeric string, bool  | number (i64)     |
//! | `Real`      | number, numeric string                 | number (f64)     |
//! | `Text`      | string, number, bool                   | string           |
//! | `Boolean`   | bool, `0`/`1`, `"true"`/`"false"`      | bool             |
//! | `Timestamp` | RFC 3339 string                        | UTC RFC 3339, ms |
//! | `Json`      | any value                              | JSON text        |
//!
//! `null` passes through for every column.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};
use stowage_data::{ColumnType, Condition, DataError, EntitySchema, Filter, Record, SortOrder};

/// Current time in the stored timestamp format.
pub fn now_timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

pub fn coerce_value(column: &str, column_type: ColumnType, value: &Value) -> Result<Value, DataError> {
    let reject = || {
        DataError::invalid_query(format!(
            "cannot store {value} in {column_type:?} column '{column}'"
        ))
    };

    if value.is_null() {
        return Ok(Value::Null);
    }
    match column_type {
        ColumnType::Integer => match value {
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Ok(Value::from(i)),
                (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(Value::from(f as i64))
                }
                _ => Err(reject()),
            },
            Value::String(s) => s.trim().parse::<i64>().map(Value::from).map_err(|_| reject()),
            Value::Bool(b) => Ok(Value::from(i64::from(*b))),
            _ => Err(reject()),
        },
        ColumnType::Real => match value {
            Value::Number(n) => n.as_f64().map(Value::from).ok_or_else(reject),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(reject),
            _ => Err(reject()),
        },
        ColumnType::Text => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(_) | Value::Bool(_) => Ok(Value::String(value.to_string())),
            _ => Err(reject()),
        },
        ColumnType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(reject()),
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(reject()),
            },
            _ => Err(reject()),
        },
        ColumnType::Timestamp => match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|t| {
                    Value::String(
                        t.with_timezone(&Utc)
                            .to_rfc3339_opts(SecondsFormat::Millis, true),
                    )
                })
                .map_err(|_| reject()),
            _ => Err(reject()),
        },
        ColumnType::Json => Ok(Value::String(value.to_string())),
    }
}

fn column_type(schema: &EntitySchema, column: &str) -> Result<ColumnType, DataError> {
    schema
        .find_column(column)
        .map(|c| c.column_type)
        .ok_or_else(|| {
            DataError::invalid_query(format!(
                "unknown column '{column}' on '{}'",
                schema.table_name()
            ))
        })
}

/// Storage form of a filter. Every field must be a column of `schema`.
pub fn coerce_filter(schema: &EntitySchema, filter: &Filter) -> Result<Filter, DataError> {
    let mut out = Filter::new();
    for (field, condition) in filter.iter() {
        let ty = column_type(schema, field)?;
        let one = |v: &Value| coerce_value(field, ty, v);
        let many = |vs: &[Value]| vs.iter().map(one).collect::<Result<Vec<_>, _>>();
        let condition = match condition {
            Condition::Eq(v) => Condition::Eq(one(v)?),
            Condition::NotEq(v) => Condition::NotEq(one(v)?),
            Condition::Gt(v) => Condition::Gt(one(v)?),
            Condition::Gte(v) => Condition::Gte(one(v)?),
            Condition::Lt(v) => Condition::Lt(one(v)?),
            Condition::Lte(v) => Condition::Lte(one(v)?),
            Condition::In(vs) => Condition::In(many(vs)?),
            Condition::NotIn(vs) => Condition::NotIn(many(vs)?),
            Condition::Like(_) | Condition::IsNull | Condition::IsNotNull => condition.clone(),
        };
        out = out.with(field, condition);
    }
    Ok(out)
}

/// Check that every sort field is a column of `schema`.
pub fn check_order(schema: &EntitySchema, order: &SortOrder) -> Result<(), DataError> {
    for (field, _) in order.iter() {
        column_type(schema, field)?;
    }
    Ok(())
}

/// Storage form of a record, in schema column order.
///
/// Keys that are not columns are dropped. With `skip_generated`, a generated column
/// holding `null` or missing is left out so the backend assigns it.
pub fn coerce_record(
    schema: &EntitySchema,
    record: &Record,
    skip_generated: bool,
) -> Result<Vec<(String, Value)>, DataError> {
    let mut out = Vec::with_capacity(record.len());
    for column in schema.columns() {
        let Some(value) = record.get(&column.name) else {
            continue;
        };
        if skip_generated && column.generated && value.is_null() {
            continue;
        }
        out.push((
            column.name.clone(),
            coerce_value(&column.name, column.column_type, value)?,
        ));
    }
    Ok(out)
}

/// Storage form of an UPDATE patch. Unlike records, unknown keys are errors.
pub fn coerce_patch(schema: &EntitySchema, patch: &Record) -> Result<Vec<(String, Value)>, DataError> {
    if patch.is_empty() {
        return Err(DataError::invalid_query("update patch is empty"));
    }
    patch
        .iter()
        .map(|(field, value)| {
            let ty = column_type(schema, field)?;
            Ok((field.clone(), coerce_value(field, ty, value)?))
        })
        .collect()
}

/// Id value in the storage form of the primary column.
pub fn coerce_id(schema: &EntitySchema, id: &Value) -> Result<Value, DataError> {
    let column = schema.id_column();
    coerce_value(column, column_type(schema, column)?, id)
}
