use serde_json::{Map, Value};

use super::types::{
    has_marker, is_present, key_name, take_present, Filter, FilterKind, BOOL_CLAUSES,
};
use crate::errors::ClientError;

/// Parse a convenience filter node into a [`Filter`].
///
/// Presence checks run in a fixed order: nodes without any structural marker
/// are passed through, fulltext nodes branch on `query_fields` then
/// `query_phrase`, attribute nodes on `field`, then `value`/`values`, then
/// the bool clauses. Shapes that would match more than one branch are
/// rejected instead of resolved by precedence.
pub fn parse_filter(node: Value, kind: FilterKind) -> Result<Filter, ClientError> {
    let node = match node {
        Value::Object(map) => map,
        other => {
            return Err(ClientError::InvalidFilter(format!(
                "{} must be a JSON object, found {}",
                kind, other
            )))
        }
    };

    if !has_marker(&node) {
        return Ok(Filter::Raw(Value::Object(node)));
    }

    match kind {
        FilterKind::Fulltext => parse_fulltext(node),
        FilterKind::Attr => parse_attr(node),
    }
}

fn parse_fulltext(mut node: Map<String, Value>) -> Result<Filter, ClientError> {
    if !is_present(&node, "query_fields") {
        return Ok(Filter::Raw(Value::Object(node)));
    }
    let field = field_name(&node, "query_fields")?;

    if let Some(phrase) = take_present(&mut node, "query_phrase") {
        return Ok(Filter::MatchPhrase { field, phrase });
    }

    let query = take_present(&mut node, "query_string").ok_or_else(|| {
        ClientError::InvalidFilter(format!(
            "fulltext filter on '{}' needs either query_string or query_phrase",
            field
        ))
    })?;
    let operator = take_present(&mut node, "operator");

    Ok(Filter::Match {
        field,
        query,
        operator,
    })
}

fn parse_attr(mut node: Map<String, Value>) -> Result<Filter, ClientError> {
    let clauses: Vec<&str> = BOOL_CLAUSES
        .iter()
        .copied()
        .filter(|clause| is_present(&node, clause))
        .collect();

    if is_present(&node, "field") {
        let field = field_name(&node, "field")?;
        if !clauses.is_empty() {
            return Err(ClientError::InvalidFilter(format!(
                "attribute filter on '{}' mixes 'field' with '{}'",
                field,
                clauses.join("', '")
            )));
        }
        if is_present(&node, "value") && is_present(&node, "values") {
            return Err(ClientError::InvalidFilter(format!(
                "attribute filter on '{}' sets both 'value' and 'values'",
                field
            )));
        }

        if let Some(value) = take_present(&mut node, "value") {
            return Ok(Filter::Equals { field, value });
        }
        if let Some(values) = take_present(&mut node, "values") {
            return Ok(Filter::In { field, values });
        }
        node.shift_remove("field");
        return Ok(Filter::Range {
            field,
            bounds: node,
        });
    }

    if clauses.is_empty() {
        return Ok(Filter::GeoDistance(node));
    }

    Ok(Filter::Bool {
        must: parse_clause(&mut node, "must")?,
        must_not: parse_clause(&mut node, "must_not")?,
        should: parse_clause(&mut node, "should")?,
    })
}

fn parse_clause(
    node: &mut Map<String, Value>,
    clause: &str,
) -> Result<Option<Vec<Filter>>, ClientError> {
    match take_present(node, clause) {
        None => Ok(None),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(parse_clause_item)
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(other) => Err(ClientError::InvalidFilter(format!(
            "'{}' must be an array of filters, found {}",
            clause, other
        ))),
    }
}

fn parse_clause_item(item: Value) -> Result<Filter, ClientError> {
    let kind = match &item {
        Value::Object(map) => FilterKind::of_clause(map),
        other => {
            return Err(ClientError::InvalidFilter(format!(
                "bool clause entries must be JSON objects, found {}",
                other
            )))
        }
    };
    parse_filter(item, kind)
}

fn field_name(node: &Map<String, Value>, key: &str) -> Result<String, ClientError> {
    let value = node.get(key).unwrap_or(&Value::Null);
    key_name(value).ok_or_else(|| {
        ClientError::InvalidFilter(format!(
            "'{}' must be a field name, found {}",
            key, value
        ))
    })
}
