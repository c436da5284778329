use serde_json::Value;

use crate::error::DataError;
use crate::filter::{Condition, Filter};
use crate::sort::{SortDirection, SortOrder};

/// SQL rendering for one table from filters, sort orders and paging.
///
/// Every identifier is validated; non-null values always travel as bind parameters.
///
/// # Example
///
/// ```ignore
/// let (sql, params) = QueryBuilder::new("posts")
///     .filter(&Filter::new().eq("status", "open"))
///     .where_null("deleted_at")
///     .order_by("votes", SortDirection::Desc)
///     .limit(10)
///     .build_select(&["*"])?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Generic SQL using `?` placeholders (default).
    Generic,
    /// SQLite-style `?` placeholders.
    Sqlite,
    /// MySQL-style `?` placeholders with backtick quoting.
    MySql,
    /// Postgres-style `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Generic | Dialect::Sqlite | Dialect::MySql => "?".to_string(),
        }
    }

    pub fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Generic | Dialect::Sqlite | Dialect::Postgres => '"',
        }
    }

    /// Whether `INSERT ... RETURNING` is available.
    pub fn supports_returning(self) -> bool {
        matches!(self, Dialect::Sqlite | Dialect::Postgres)
    }

    /// LIMIT clause standing for "no limit", for dialects that need one before OFFSET.
    fn unbounded_limit(self) -> Option<&'static str> {
        match self {
            Dialect::Sqlite => Some("-1"),
            Dialect::MySql => Some("18446744073709551615"),
            Dialect::Generic | Dialect::Postgres => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierPolicy {
    /// Validate identifiers against a conservative pattern.
    #[default]
    Validate,
    /// Validate and quote identifiers using the dialect quoting style.
    Quote,
}

/// Rendered statement and its bind values, in placeholder order.
pub type Statement = (String, Vec<Value>);

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    conditions: Vec<(String, Condition)>,
    order: Vec<(String, SortDirection)>,
    limit_val: Option<u64>,
    offset_val: Option<u64>,
    dialect: Dialect,
    identifier_policy: IdentifierPolicy,
}

impl QueryBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit_val: None,
            offset_val: None,
            dialect: Dialect::Generic,
            identifier_policy: IdentifierPolicy::Validate,
        }
    }

    /// Create a new builder with an explicit SQL dialect.
    pub fn new_with_dialect(table: &str, dialect: Dialect) -> Self {
        Self::new(table).dialect(dialect)
    }

    /// Set the SQL dialect (affects placeholder style, quoting and paging).
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn identifier_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.identifier_policy = policy;
        self
    }

    /// AND every condition of `filter` onto the WHERE clause.
    pub fn filter(mut self, filter: &Filter) -> Self {
        self.conditions.extend(
            filter
                .iter()
                .map(|(field, cond)| (field.to_string(), cond.clone())),
        );
        self
    }

    pub fn where_condition(mut self, column: &str, condition: Condition) -> Self {
        self.conditions.push((column.to_string(), condition));
        self
    }

    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_condition(column, Condition::Eq(value.into()))
    }

    pub fn where_in(self, column: &str, values: Vec<Value>) -> Self {
        self.where_condition(column, Condition::In(values))
    }

    pub fn where_null(self, column: &str) -> Self {
        self.where_condition(column, Condition::IsNull)
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.where_condition(column, Condition::IsNotNull)
    }

    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.order.push((column.to_string(), direction));
        self
    }

    /// Append every entry of `order`, keeping its sequence.
    pub fn order(mut self, order: &SortOrder) -> Self {
        self.order
            .extend(order.iter().map(|(field, dir)| (field.to_string(), dir)));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_val = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset_val = Some(offset);
        self
    }

    /// Build a SELECT over `columns` (`"*"` allowed).
    pub fn build_select(&self, columns: &[&str]) -> Result<Statement, QueryError> {
        let table = self.ident(&self.table, false, "table")?;
        let columns = self.column_list(columns)?;

        let mut sql = format!("SELECT {columns} FROM {table}");
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params)?;
        self.append_order(&mut sql)?;
        self.append_limit_offset(&mut sql);
        Ok((sql, params))
    }

    /// Build a COUNT over the WHERE clause. Order and paging are ignored.
    pub fn build_count(&self) -> Result<Statement, QueryError> {
        let table = self.ident(&self.table, false, "table")?;
        let mut sql = format!("SELECT COUNT(*) FROM {table}");
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    /// Build `UPDATE ... SET ... WHERE ...`. SET values bind before WHERE values.
    pub fn build_update(&self, assignments: &[(&str, Value)]) -> Result<Statement, QueryError> {
        if assignments.is_empty() {
            return Err(QueryError::EmptyAssignments);
        }
        let table = self.ident(&self.table, false, "table")?;
        let mut params = Vec::with_capacity(assignments.len());
        let mut sets = Vec::with_capacity(assignments.len());
        for (column, value) in assignments {
            let column = self.ident(column, false, "column")?;
            sets.push(format!("{column} = {}", self.bind(&mut params, value)));
        }

        let mut sql = format!("UPDATE {table} SET {}", sets.join(", "));
        self.append_where(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    /// Build `DELETE FROM ... WHERE ...`. Without conditions every row goes.
    pub fn build_delete(&self) -> Result<Statement, QueryError> {
        let table = self.ident(&self.table, false, "table")?;
        let mut sql = format!("DELETE FROM {table}");
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    /// Build an INSERT of one row, with `RETURNING returning` when given.
    ///
    /// Conditions, order and paging are ignored.
    pub fn build_insert(
        &self,
        values: &[(&str, Value)],
        returning: Option<&[&str]>,
    ) -> Result<Statement, QueryError> {
        let table = self.ident(&self.table, false, "table")?;
        let mut params = Vec::with_capacity(values.len());
        let mut sql = if values.is_empty() {
            match self.dialect {
                Dialect::MySql => format!("INSERT INTO {table} () VALUES ()"),
                _ => format!("INSERT INTO {table} DEFAULT VALUES"),
            }
        } else {
            let columns = values
                .iter()
                .map(|(c, _)| self.ident(c, false, "column"))
                .collect::<Result<Vec<_>, _>>()?;
            let placeholders: Vec<_> = values
                .iter()
                .map(|(_, v)| self.bind(&mut params, v))
                .collect();
            format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        if let Some(columns) = returning {
            if !self.dialect.supports_returning() {
                return Err(QueryError::Unsupported("RETURNING"));
            }
            sql.push_str(&format!(" RETURNING {}", self.column_list(columns)?));
        }
        Ok((sql, params))
    }

    /// Placeholder for `value`, pushing it onto `params`. `null` renders as a literal
    /// so that no untyped null parameter reaches the backend.
    fn bind(&self, params: &mut Vec<Value>, value: &Value) -> String {
        if value.is_null() {
            return "NULL".to_string();
        }
        params.push(value.clone());
        self.dialect.placeholder(params.len())
    }

    fn append_where(&self, sql: &mut String, params: &mut Vec<Value>) -> Result<(), QueryError> {
        if self.conditions.is_empty() {
            return Ok(());
        }
        let mut clauses = Vec::with_capacity(self.conditions.len());
        for (column, cond) in &self.conditions {
            let col = self.ident(column, false, "column")?;
            let mut bind = |value: &Value| self.bind(params, value);
            let clause = match cond {
                Condition::Eq(Value::Null) | Condition::IsNull => format!("{col} IS NULL"),
                Condition::NotEq(Value::Null) | Condition::IsNotNull => {
                    format!("{col} IS NOT NULL")
                }
                Condition::Eq(v) => format!("{col} = {}", bind(v)),
                Condition::NotEq(v) => format!("{col} <> {}", bind(v)),
                Condition::Gt(v) => format!("{col} > {}", bind(v)),
                Condition::Gte(v) => format!("{col} >= {}", bind(v)),
                Condition::Lt(v) => format!("{col} < {}", bind(v)),
                Condition::Lte(v) => format!("{col} <= {}", bind(v)),
                Condition::Like(pattern) => {
                    format!("{col} LIKE {}", bind(&Value::String(pattern.clone())))
                }
                // An empty list matches nothing (IN) or everything (NOT IN).
                Condition::In(vals) if vals.is_empty() => "1 = 0".to_string(),
                Condition::NotIn(vals) if vals.is_empty() => "1 = 1".to_string(),
                Condition::In(vals) => {
                    let placeholders: Vec<_> = vals.iter().map(&mut bind).collect();
                    format!("{col} IN ({})", placeholders.join(", "))
                }
                Condition::NotIn(vals) => {
                    let placeholders: Vec<_> = vals.iter().map(&mut bind).collect();
                    format!("{col} NOT IN ({})", placeholders.join(", "))
                }
            };
            clauses.push(clause);
        }
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
        Ok(())
    }

    fn append_order(&self, sql: &mut String) -> Result<(), QueryError> {
        if self.order.is_empty() {
            return Ok(());
        }
        let mut clauses = Vec::with_capacity(self.order.len());
        for (col, direction) in &self.order {
            let col = self.ident(col, false, "column")?;
            clauses.push(format!("{col} {}", direction.as_sql()));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(&clauses.join(", "));
        Ok(())
    }

    fn append_limit_offset(&self, sql: &mut String) {
        match (self.limit_val, self.offset_val) {
            (Some(limit), _) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(_)) => {
                if let Some(all) = self.dialect.unbounded_limit() {
                    sql.push_str(&format!(" LIMIT {all}"));
                }
            }
            (None, None) => {}
        }
        if let Some(offset) = self.offset_val {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
    }

    fn column_list(&self, columns: &[&str]) -> Result<String, QueryError> {
        let mut out = Vec::with_capacity(columns.len());
        for col in columns {
            out.push(self.ident(col, true, "column")?);
        }
        Ok(out.join(", "))
    }

    fn ident(&self, ident: &str, allow_star: bool, kind: &'static str) -> Result<String, QueryError> {
        if !is_valid_identifier(ident, allow_star) {
            return Err(QueryError::InvalidIdentifier {
                kind,
                ident: ident.to_string(),
            });
        }
        match self.identifier_policy {
            IdentifierPolicy::Quote => Ok(quote_identifier(ident, self.dialect, allow_star)),
            IdentifierPolicy::Validate => Ok(ident.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    InvalidIdentifier { kind: &'static str, ident: String },
    /// UPDATE with nothing to set.
    EmptyAssignments,
    /// The dialect cannot render this construct.
    Unsupported(&'static str),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidIdentifier { kind, ident } => {
                write!(f, "Invalid {kind} identifier: {ident}")
            }
            QueryError::EmptyAssignments => write!(f, "Nothing to update"),
            QueryError::Unsupported(what) => write!(f, "{what} is not supported by this dialect"),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<QueryError> for DataError {
    fn from(err: QueryError) -> Self {
        DataError::InvalidQuery(err.to_string())
    }
}

pub(crate) fn is_valid_identifier(ident: &str, allow_star: bool) -> bool {
    if ident.is_empty() {
        return false;
    }
    let parts: Vec<&str> = ident.split('.').collect();
    for (idx, part) in parts.iter().enumerate() {
        if allow_star && *part == "*" {
            return idx + 1 == parts.len();
        }
        if !is_valid_segment(part) {
            return false;
        }
    }
    true
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quote a validated identifier, segment by segment.
pub fn quote_identifier(ident: &str, dialect: Dialect, allow_star: bool) -> String {
    let quote = dialect.quote_char();
    let parts: Vec<&str> = ident.split('.').collect();
    let last_idx = parts.len().saturating_sub(1);
    parts
        .into_iter()
        .enumerate()
        .map(|(idx, part)| {
            if allow_star && part == "*" && idx == last_idx {
                part.to_string()
            } else {
                format!("{quote}{part}{quote}")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}
