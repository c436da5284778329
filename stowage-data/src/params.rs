use serde::Deserialize;
use serde_json::Value;

use crate::filter::Filter;
use crate::sort::SortSpec;

/// Loosely-typed numeric input (`offset`, `limit`).
///
/// Accepts numbers and numeric strings; anything else is kept as `Other` and
/// treated as "not specified".
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericParam {
    Integer(i64),
    Float(f64),
    Text(String),
    Other(Value),
}

impl NumericParam {
    /// Numeric value of the parameter, `None` when it is not a number.
    ///
    /// Text is trimmed; an empty string counts as zero. `0x`, `0o` and `0b`
    /// prefixes are read as hexadecimal, octal and binary integers.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            NumericParam::Integer(i) => Some(*i as f64),
            NumericParam::Float(f) => Some(*f),
            NumericParam::Text(s) => parse_numeric_text(s),
            NumericParam::Other(_) => None,
        }
    }

    /// The value as a count, if it is a finite, integral, strictly positive number.
    pub fn positive_integer(&self) -> Option<u64> {
        if let NumericParam::Integer(i) = self {
            return u64::try_from(*i).ok().filter(|n| *n > 0);
        }
        let n = self.to_number()?;
        if n.is_finite() && n.fract() == 0.0 && n > 0.0 && n <= u64::MAX as f64 {
            Some(n as u64)
        } else {
            None
        }
    }
}

fn parse_numeric_text(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    let radix = match s.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&s[2..], radix).ok().map(|n| n as f64);
    }
    // Rust also accepts "inf"/"nan" spellings; the finiteness check rejects them later.
    s.parse::<f64>().ok()
}

impl From<i64> for NumericParam {
    fn from(n: i64) -> Self {
        NumericParam::Integer(n)
    }
}

impl From<f64> for NumericParam {
    fn from(n: f64) -> Self {
        NumericParam::Float(n)
    }
}

impl From<&str> for NumericParam {
    fn from(s: &str) -> Self {
        NumericParam::Text(s.to_string())
    }
}

/// Relation names to include. Only a list of strings is honoured.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RelationsParam {
    List(Vec<String>),
    Other(Value),
}

/// Parameter bag accepted by `find`, `count` and `find_one`.
///
/// Every field is optional and validated on its own; see
/// [`build_descriptor`](crate::descriptor::build_descriptor).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FindParams {
    pub query: Option<Filter>,
    pub sort: Option<SortSpec>,
    pub relations: Option<RelationsParam>,
    pub offset: Option<NumericParam>,
    pub limit: Option<NumericParam>,
    /// Include soft-deleted rows.
    #[serde(alias = "withDeleted")]
    pub with_deleted: bool,
}

impl FindParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, filter: Filter) -> Self {
        self.query = Some(filter);
        self
    }

    pub fn sort(mut self, spec: impl Into<SortSpec>) -> Self {
        self.sort = Some(spec.into());
        self
    }

    pub fn relations<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relations = Some(RelationsParam::List(
            names.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn offset(mut self, offset: impl Into<NumericParam>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    pub fn limit(mut self, limit: impl Into<NumericParam>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn with_deleted(mut self) -> Self {
        self.with_deleted = true;
        self
    }
}
