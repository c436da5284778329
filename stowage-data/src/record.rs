use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A persisted row as a JSON object keyed by column name.
pub type Record = serde_json::Map<String, Value>;

/// Patch applied by `update_by_id`: every key of `set` overwrites the stored value.
///
/// Deserializes from `{"$set": {...}}` as well as `{"set": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePatch {
    #[serde(rename = "$set", alias = "set", default)]
    pub set: Record,
}

impl UpdatePatch {
    pub fn new(set: Record) -> Self {
        Self { set }
    }

    /// Add one field to the patch.
    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set.insert(name.to_string(), value.into());
        self
    }
}

/// Summary of a multi-row update or restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    pub affected: u64,
}

/// Summary of a multi-row removal (hard or soft).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteResult {
    pub affected: u64,
}

/// Result of `remove_by_id`, independent of whether the row existed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Removed {
    pub id: Value,
}

/// How `insert_many_with` issues the individual inserts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertMode {
    /// Fire every insert at once and wait for all of them to settle.
    #[default]
    Concurrent,
    /// Insert one record at a time, stopping at the first failure.
    Sequential,
}

/// Per-service settings the host hands over at bind time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceSettings {
    /// Removals mark rows deleted instead of deleting them.
    #[serde(default, alias = "useSoftDelete")]
    pub use_soft_delete: bool,
}

impl ServiceSettings {
    pub fn soft_delete() -> Self {
        Self {
            use_soft_delete: true,
        }
    }
}

/// Build a [`Record`] from `key => value` pairs.
///
/// ```ignore
/// let post = record! { "title" => "Hello", "votes" => 0 };
/// ```
#[macro_export]
macro_rules! record {
    () => { $crate::Record::new() };
    ( $( $key:expr => $value:expr ),+ $(,)? ) => {{
        let mut r = $crate::Record::new();
        $( r.insert(::std::string::String::from($key), $crate::serde_json::Value::from($value)); )+
        r
    }};
}
