use crate::filter::Filter;
use crate::params::{FindParams, RelationsParam};
use crate::sort::{parse_sort, SortOrder};

/// Canonical form of one query, built fresh for every call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDescriptor {
    pub filter: Filter,
    pub order: Option<SortOrder>,
    pub relations: Option<Vec<String>>,
    pub skip: Option<u64>,
    pub take: Option<u64>,
    pub with_deleted: bool,
}

impl QueryDescriptor {
    /// A descriptor matching every record in backend order.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }
}

/// Normalize a caller's parameter bag into a [`QueryDescriptor`].
///
/// - no params: every record, unordered, unpaged;
/// - `query` becomes the filter (empty when missing);
/// - `sort` is kept only when it parses to a non-empty order;
/// - `relations` is kept only when it is a list;
/// - `offset`/`limit` become `skip`/`take` only when they are strictly positive integers.
pub fn build_descriptor(params: Option<&FindParams>) -> QueryDescriptor {
    let Some(params) = params else {
        return QueryDescriptor::all();
    };

    let order = params
        .sort
        .as_ref()
        .map(parse_sort)
        .filter(|order| !order.is_empty());

    let relations = match &params.relations {
        Some(RelationsParam::List(names)) => Some(names.clone()),
        _ => None,
    };

    QueryDescriptor {
        filter: params.query.clone().unwrap_or_default(),
        order,
        relations,
        skip: params.offset.as_ref().and_then(|o| o.positive_integer()),
        take: params.limit.as_ref().and_then(|l| l.positive_integer()),
        with_deleted: params.with_deleted,
    }
}
