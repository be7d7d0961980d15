//! Rewrites the flat convenience shape of a search request (`fulltext_filter`,
//! `attr_filter`, labeled `sort`/`aggs`/`expressions`/`highlight.fields`
//! entries) into the nested query JSON the Manticore HTTP API expects.

mod builder;
mod parser;
mod types;

pub use builder::{merge_entries, relabel};
pub use parser::parse_filter;
pub use types::{Filter, FilterKind, NodeKind, BOOL_CLAUSES, STRUCTURAL_MARKERS};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::ClientError;
use types::is_present;

/// Dotted paths whose arrays are folded into a single mapping
const LABELED_PATHS: [(&[&str], NodeKind); 3] = [
    (&["expressions"], NodeKind::Expression),
    (&["aggs"], NodeKind::Aggregation),
    (&["highlight", "fields"], NodeKind::HighlightField),
];

/// Normalize a search request in place.
///
/// Applying it to an already normalized request changes nothing. On error the
/// request may be left partially rewritten.
pub fn normalize(request: &mut Map<String, Value>) -> Result<(), ClientError> {
    rename_source(request);
    merge_filters(request)?;
    relabel_sort(request)?;
    for (path, kind) in LABELED_PATHS {
        relabel_path(request, path, kind)?;
    }
    Ok(())
}

/// Owning form of [`normalize`] for arbitrary JSON values
pub fn normalized(request: Value) -> Result<Value, ClientError> {
    match request {
        Value::Object(mut map) => {
            normalize(&mut map)?;
            Ok(Value::Object(map))
        }
        other => Err(ClientError::InvalidRequest(format!(
            "search request must be a JSON object, found {}",
            other
        ))),
    }
}

fn rename_source(request: &mut Map<String, Value>) {
    if !is_present(request, "source") {
        return;
    }
    if let Some(source) = request.shift_remove("source") {
        request.insert("_source".to_string(), source);
    }
}

fn merge_filters(request: &mut Map<String, Value>) -> Result<(), ClientError> {
    let mut query: Option<Map<String, Value>> = None;

    for kind in [FilterKind::Fulltext, FilterKind::Attr] {
        let node = match request.shift_remove(kind.request_key()) {
            Some(Value::Null) | None => continue,
            Some(node) => node,
        };
        match parse_filter(node, kind)?.into_wire() {
            Value::Object(rendered) => query.get_or_insert_with(Map::new).extend(rendered),
            other => {
                return Err(ClientError::InvalidFilter(format!(
                    "{} rendered to a non-object: {}",
                    kind, other
                )))
            }
        }
    }

    if let Some(query) = query {
        debug!(keys = ?query.keys().collect::<Vec<_>>(), "Merged filters into query");
        if let Some(previous) = request.insert("query".to_string(), Value::Object(query)) {
            warn!(%previous, "Replaced existing query with fulltext_filter/attr_filter");
        }
    }
    Ok(())
}

fn relabel_sort(request: &mut Map<String, Value>) -> Result<(), ClientError> {
    if let Some(Value::Array(entries)) = request.get_mut("sort") {
        let taken = std::mem::take(entries);
        *entries = taken
            .into_iter()
            .map(|entry| relabel(entry, NodeKind::Sort))
            .collect::<Result<Vec<_>, _>>()?;
    }
    Ok(())
}

fn relabel_path(
    request: &mut Map<String, Value>,
    path: &[&str],
    kind: NodeKind,
) -> Result<(), ClientError> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(());
    };

    let mut container = request;
    for segment in parents {
        match container.get_mut(*segment) {
            Some(Value::Object(next)) => container = next,
            _ => return Ok(()),
        }
    }

    // Map-shaped collections are already normalized
    let entries = match container.get_mut(*last) {
        Some(Value::Array(entries)) => std::mem::take(entries),
        _ => return Ok(()),
    };
    let merged = merge_entries(entries, kind)?;
    container.insert(last.to_string(), Value::Object(merged));
    Ok(())
}
