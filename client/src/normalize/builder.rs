use serde_json::{Map, Value};

use super::types::{has_marker, key_name, singleton, Filter, NodeKind};
use crate::errors::ClientError;

impl Filter {
    /// Render into the nested query shape the engine expects
    pub fn into_wire(self) -> Value {
        match self {
            Filter::Match {
                field,
                query,
                operator,
            } => {
                let body = match operator {
                    Some(operator) => {
                        let mut body = Map::new();
                        body.insert("query".to_string(), query);
                        body.insert("operator".to_string(), operator);
                        Value::Object(body)
                    }
                    None => query,
                };
                singleton("match", singleton(field, body))
            }
            Filter::MatchPhrase { field, phrase } => {
                singleton("match_phrase", singleton(field, phrase))
            }
            Filter::Equals { field, value } => singleton("equals", singleton(field, value)),
            Filter::In { field, values } => singleton("in", singleton(field, values)),
            Filter::Range { field, bounds } => {
                singleton("range", singleton(field, Value::Object(bounds)))
            }
            Filter::GeoDistance(node) => singleton("geo_distance", Value::Object(node)),
            Filter::Bool {
                must,
                must_not,
                should,
            } => {
                let mut clauses = Map::new();
                for (name, filters) in [("must", must), ("must_not", must_not), ("should", should)]
                {
                    if let Some(filters) = filters {
                        let rendered = filters.into_iter().map(Filter::into_wire).collect();
                        clauses.insert(name.to_string(), Value::Array(rendered));
                    }
                }
                singleton("bool", Value::Object(clauses))
            }
            Filter::Raw(node) => node,
        }
    }
}

/// Rewrite a labeled entry into `{label: rest}` (`{label: {terms: rest}}` for aggregations).
///
/// Non-objects, unmarked objects and entries without an `attr`/`name` label
/// are returned unchanged.
pub fn relabel(node: Value, kind: NodeKind) -> Result<Value, ClientError> {
    let mut node = match node {
        Value::Object(map) => map,
        other => return Ok(other),
    };
    if !has_marker(&node) {
        return Ok(Value::Object(node));
    }

    // A non-scalar `attr`/`name` is a column of that name already in wire form
    let label = ["attr", "name"]
        .into_iter()
        .find_map(|key| node.get(key).and_then(key_name).map(|label| (key, label)));
    let Some((label_key, label)) = label else {
        return Ok(Value::Object(node));
    };
    node.shift_remove(label_key);

    let body = match kind {
        NodeKind::Aggregation => singleton("terms", Value::Object(node)),
        _ => Value::Object(node),
    };
    Ok(singleton(label, body))
}

/// Relabel every entry and fold them into one mapping; later keys win
pub fn merge_entries(
    entries: Vec<Value>,
    kind: NodeKind,
) -> Result<Map<String, Value>, ClientError> {
    let mut merged = Map::new();
    for entry in entries {
        match relabel(entry, kind)? {
            Value::Object(map) => merged.extend(map),
            other => {
                return Err(ClientError::InvalidNode(format!(
                    "{} entries must be JSON objects, found {}",
                    kind, other
                )))
            }
        }
    }
    Ok(merged)
}
