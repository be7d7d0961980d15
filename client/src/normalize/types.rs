//! Parsed filter tree and node kinds for the request normalizer

use serde_json::{Map, Value};

/// Keys whose presence marks a node as a convenience shape that gets rewritten
pub const STRUCTURAL_MARKERS: [&str; 10] = [
    "attr",
    "name",
    "query_fields",
    "value",
    "values",
    "field",
    "location_anchor",
    "must",
    "must_not",
    "should",
];

pub const BOOL_CLAUSES: [&str; 3] = ["must", "must_not", "should"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Fulltext,
    Attr,
}

impl FilterKind {
    /// Top-level request key holding a filter of this kind
    pub fn request_key(self) -> &'static str {
        match self {
            FilterKind::Fulltext => "fulltext_filter",
            FilterKind::Attr => "attr_filter",
        }
    }

    /// Kind of an element inside a `must`/`must_not`/`should` clause
    pub fn of_clause(node: &Map<String, Value>) -> Self {
        if is_present(node, "query_fields") || is_present(node, "query_string") {
            FilterKind::Fulltext
        } else {
            FilterKind::Attr
        }
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.request_key())
    }
}

/// Collections whose entries are labeled by `attr` or `name`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Sort,
    Expression,
    Aggregation,
    HighlightField,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Sort => write!(f, "sort"),
            NodeKind::Expression => write!(f, "expressions"),
            NodeKind::Aggregation => write!(f, "aggs"),
            NodeKind::HighlightField => write!(f, "highlight.fields"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Match {
        field: String,
        query: Value,
        operator: Option<Value>,
    },
    MatchPhrase {
        field: String,
        phrase: Value,
    },
    Equals {
        field: String,
        value: Value,
    },
    In {
        field: String,
        values: Value,
    },
    Range {
        field: String,
        bounds: Map<String, Value>,
    },
    GeoDistance(Map<String, Value>),
    Bool {
        must: Option<Vec<Filter>>,
        must_not: Option<Vec<Filter>>,
        should: Option<Vec<Filter>>,
    },
    /// Already in wire form, or not a shape the normalizer knows
    Raw(Value),
}

/// A key counts as present when it exists and is not `null`
pub(crate) fn is_present(node: &Map<String, Value>, key: &str) -> bool {
    node.get(key).is_some_and(|v| !v.is_null())
}

pub(crate) fn has_marker(node: &Map<String, Value>) -> bool {
    STRUCTURAL_MARKERS.iter().any(|key| is_present(node, key))
}

/// Removes `key` and returns its value unless it was absent or `null`
pub(crate) fn take_present(node: &mut Map<String, Value>, key: &str) -> Option<Value> {
    match node.shift_remove(key) {
        Some(Value::Null) | None => None,
        Some(value) => Some(value),
    }
}

/// Scalar values usable as an object key
pub(crate) fn key_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn singleton(key: impl Into<String>, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.into(), value);
    Value::Object(map)
}
