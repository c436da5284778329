//! Filter criteria: an ordered list of `field -> condition` pairs, AND-ed together.
//!
//! The JSON form is a plain object:
//!
//! | JSON value                  | Condition          |
//! |-----------------------------|--------------------|
//! | scalar (`1`, `"open"`)      | `field = value`    |
//! | `null`                      | `field IS NULL`    |
//! | array                       | `field IN (...)`   |
//! | `{"$ne": v}` / `$gt` `$gte` `$lt` `$lte` | comparison |
//! | `{"$like": "%x%"}`          | `field LIKE ...`   |
//! | `{"$in": [...]}` / `{"$nin": [...]}` | (NOT) IN  |
//! | `{"$null": true/false}`     | IS (NOT) NULL      |

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::DataError;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    NotEq(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Like(String),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    IsNull,
    IsNotNull,
}

impl Condition {
    /// Decode the JSON form of a condition for `field`.
    pub fn from_json(field: &str, value: &Value) -> Result<Self, DataError> {
        match value {
            Value::Null => Ok(Condition::IsNull),
            Value::Array(items) => Ok(Condition::In(scalars(field, items)?)),
            Value::Object(ops) => {
                let mut iter = ops.iter();
                match (iter.next(), iter.next()) {
                    (Some((op, arg)), None) => Self::from_operator(field, op, arg),
                    _ => Err(DataError::invalid_query(format!(
                        "filter on '{field}' must hold exactly one operator"
                    ))),
                }
            }
            scalar => Ok(Condition::Eq(scalar.clone())),
        }
    }

    fn from_operator(field: &str, op: &str, arg: &Value) -> Result<Self, DataError> {
        let scalar = |arg: &Value| -> Result<Value, DataError> {
            match arg {
                Value::Array(_) | Value::Object(_) => Err(DataError::invalid_query(format!(
                    "operator '{op}' on '{field}' expects a scalar"
                ))),
                v => Ok(v.clone()),
            }
        };
        let list = |arg: &Value| -> Result<Vec<Value>, DataError> {
            match arg {
                Value::Array(items) => scalars(field, items),
                _ => Err(DataError::invalid_query(format!(
                    "operator '{op}' on '{field}' expects an array"
                ))),
            }
        };

        match op {
            "$eq" => Ok(match scalar(arg)? {
                Value::Null => Condition::IsNull,
                v => Condition::Eq(v),
            }),
            "$ne" => Ok(match scalar(arg)? {
                Value::Null => Condition::IsNotNull,
                v => Condition::NotEq(v),
            }),
            "$gt" => Ok(Condition::Gt(scalar(arg)?)),
            "$gte" => Ok(Condition::Gte(scalar(arg)?)),
            "$lt" => Ok(Condition::Lt(scalar(arg)?)),
            "$lte" => Ok(Condition::Lte(scalar(arg)?)),
            "$like" => match arg {
                Value::String(pattern) => Ok(Condition::Like(pattern.clone())),
                _ => Err(DataError::invalid_query(format!(
                    "operator '$like' on '{field}' expects a string"
                ))),
            },
            "$in" => Ok(Condition::In(list(arg)?)),
            "$nin" => Ok(Condition::NotIn(list(arg)?)),
            "$null" => match arg {
                Value::Bool(true) => Ok(Condition::IsNull),
                Value::Bool(false) => Ok(Condition::IsNotNull),
                _ => Err(DataError::invalid_query(format!(
                    "operator '$null' on '{field}' expects a boolean"
                ))),
            },
            other => Err(DataError::invalid_query(format!(
                "unknown operator '{other}' on '{field}'"
            ))),
        }
    }
}

fn scalars(field: &str, items: &[Value]) -> Result<Vec<Value>, DataError> {
    items
        .iter()
        .map(|v| match v {
            Value::Array(_) | Value::Object(_) => Err(DataError::invalid_query(format!(
                "list for '{field}' must contain scalars"
            ))),
            v => Ok(v.clone()),
        })
        .collect()
}

/// Filter criteria, AND-ed in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Condition)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition on `field`.
    pub fn with(mut self, field: &str, condition: Condition) -> Self {
        self.conditions.push((field.to_string(), condition));
        self
    }

    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Null => self.with(field, Condition::IsNull),
            v => self.with(field, Condition::Eq(v)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.conditions.iter().map(|(f, c)| (f.as_str(), c))
    }

    /// Decode the JSON object form (see module docs).
    pub fn from_json(map: &Map<String, Value>) -> Result<Self, DataError> {
        let conditions = map
            .iter()
            .map(|(field, value)| Ok((field.clone(), Condition::from_json(field, value)?)))
            .collect::<Result<_, DataError>>()?;
        Ok(Self { conditions })
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Filter::from_json(&map).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<Value> for Filter {
    type Error = DataError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Filter::from_json(&map),
            Value::Null => Ok(Filter::new()),
            other => Err(DataError::invalid_query(format!(
                "filter must be an object, got {other}"
            ))),
        }
    }
}
