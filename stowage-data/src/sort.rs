use std::fmt;
use std::str::FromStr;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Prefix marking a descending sort token (`-created_at`).
pub const DESC_MARKER: char = '-';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SortDirection {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" | "ASCENDING" | "1" => Ok(SortDirection::Asc),
            "DESC" | "DESCENDING" | "-1" => Ok(SortDirection::Desc),
            other => Err(format!("invalid sort direction '{other}'")),
        }
    }
}

impl<'de> Deserialize<'de> for SortDirection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => s.parse().map_err(de::Error::custom),
            Value::Number(n) => match n.as_i64() {
                Some(1) => Ok(SortDirection::Asc),
                Some(-1) => Ok(SortDirection::Desc),
                _ => Err(de::Error::custom(format!("invalid sort direction {n}"))),
            },
            other => Err(de::Error::custom(format!("invalid sort direction {other}"))),
        }
    }
}

/// Ordered `field -> direction` mapping. Earlier entries sort first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrder(Vec<(String, SortDirection)>);

impl SortOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the direction for `field`.
    ///
    /// A field already present keeps its position and takes the new direction.
    pub fn set(&mut self, field: &str, direction: SortDirection) {
        match self.0.iter_mut().find(|(f, _)| f == field) {
            Some(entry) => entry.1 = direction,
            None => self.0.push((field.to_string(), direction)),
        }
    }

    pub fn then(mut self, field: &str, direction: SortDirection) -> Self {
        self.set(field, direction);
        self
    }

    pub fn get(&self, field: &str) -> Option<SortDirection> {
        self.0.iter().find(|(f, _)| f == field).map(|(_, d)| *d)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SortDirection)> {
        self.0.iter().map(|(f, d)| (f.as_str(), *d))
    }
}

impl<S: Into<String>> FromIterator<(S, SortDirection)> for SortOrder {
    fn from_iter<I: IntoIterator<Item = (S, SortDirection)>>(iter: I) -> Self {
        let mut order = SortOrder::new();
        for (field, direction) in iter {
            order.set(&field.into(), direction);
        }
        order
    }
}

impl Serialize for SortOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, direction) in &self.0 {
            map.serialize_entry(field, direction)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SortOrder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderVisitor;

        impl<'de> Visitor<'de> for OrderVisitor {
            type Value = SortOrder;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field to ASC/DESC")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SortOrder, A::Error> {
                let mut order = SortOrder::new();
                while let Some((field, direction)) = access.next_entry::<String, SortDirection>()? {
                    order.set(&field, direction);
                }
                Ok(order)
            }
        }

        deserializer.deserialize_map(OrderVisitor)
    }
}

/// Sort specification as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SortSpec {
    /// `"title,-votes"` or `"title -votes"`.
    Text(String),
    /// `["title", "-votes"]`.
    Tokens(Vec<String>),
    /// `{"title": "ASC", "votes": "DESC"}`, used as is.
    Mapping(SortOrder),
    /// Anything else; sorts nothing.
    Other(Value),
}

impl From<&str> for SortSpec {
    fn from(s: &str) -> Self {
        SortSpec::Text(s.to_string())
    }
}

impl From<String> for SortSpec {
    fn from(s: String) -> Self {
        SortSpec::Text(s)
    }
}

impl From<Vec<&str>> for SortSpec {
    fn from(tokens: Vec<&str>) -> Self {
        SortSpec::Tokens(tokens.into_iter().map(String::from).collect())
    }
}

impl From<SortOrder> for SortSpec {
    fn from(order: SortOrder) -> Self {
        SortSpec::Mapping(order)
    }
}

/// Turn a sort specification into an ordered `field -> direction` mapping.
///
/// Text is split on commas and whitespace. Each token is ascending unless it starts
/// with [`DESC_MARKER`]. Empty tokens and a lone marker are skipped. Unsupported
/// shapes yield an empty order.
pub fn parse_sort(spec: &SortSpec) -> SortOrder {
    match spec {
        SortSpec::Text(text) => {
            parse_tokens(text.split(|c: char| c == ',' || c.is_whitespace()))
        }
        SortSpec::Tokens(tokens) => parse_tokens(tokens.iter().map(String::as_str)),
        SortSpec::Mapping(order) => order.clone(),
        SortSpec::Other(_) => SortOrder::new(),
    }
}

fn parse_tokens<'a>(tokens: impl Iterator<Item = &'a str>) -> SortOrder {
    let mut order = SortOrder::new();
    for token in tokens.map(str::trim).filter(|t| !t.is_empty()) {
        let (field, direction) = match token.strip_prefix(DESC_MARKER) {
            Some(rest) => (rest, SortDirection::Desc),
            None => (token, SortDirection::Asc),
        };
        if !field.is_empty() {
            order.set(field, direction);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expected() -> SortOrder {
        SortOrder::new()
            .then("a", SortDirection::Asc)
            .then("b", SortDirection::Desc)
    }

    #[test]
    fn test_all_shapes_agree() {
        let text = parse_sort(&"a,-b".into());
        let tokens = parse_sort(&vec!["a", "-b"].into());
        let mapping: SortSpec = serde_json::from_value(json!({"a": "ASC", "b": "DESC"})).unwrap();

        assert_eq!(text, expected());
        assert_eq!(tokens, expected());
        assert_eq!(parse_sort(&mapping), expected());
    }

    #[test]
    fn test_space_and_mixed_separators() {
        assert_eq!(parse_sort(&"a -b".into()), expected());
        assert_eq!(parse_sort(&"a, -b".into()), expected());
        assert_eq!(parse_sort(&" a,,-b ".into()), expected());
    }

    #[test]
    fn test_token_order_is_kept() {
        let order = parse_sort(&"-z,a,m".into());
        let fields: Vec<_> = order.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_repeated_field_keeps_first_position() {
        let order = parse_sort(&"a,b,-a".into());
        let entries: Vec<_> = order.iter().collect();
        assert_eq!(
            entries,
            vec![("a", SortDirection::Desc), ("b", SortDirection::Asc)]
        );
    }

    #[test]
    fn test_lone_marker_skipped() {
        assert_eq!(parse_sort(&"-".into()), SortOrder::new());
    }

    #[test]
    fn test_unsupported_shapes_are_empty() {
        let number: SortSpec = serde_json::from_value(json!(42)).unwrap();
        let mixed: SortSpec = serde_json::from_value(json!(["a", 1])).unwrap();
        let bad_dir: SortSpec = serde_json::from_value(json!({"a": "sideways"})).unwrap();
        assert!(parse_sort(&number).is_empty());
        assert!(parse_sort(&mixed).is_empty());
        assert!(parse_sort(&bad_dir).is_empty());
    }

    #[test]
    fn test_mapping_passes_through_with_numeric_directions() {
        let spec: SortSpec = serde_json::from_value(json!({"b": -1, "a": "asc"})).unwrap();
        let order = parse_sort(&spec);
        assert_eq!(order.get("a"), Some(SortDirection::Asc));
        assert_eq!(order.get("b"), Some(SortDirection::Desc));
        let fields: Vec<_> = order.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["b", "a"]);
    }
}
