use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Search request in the flat convenience shape.
///
/// Serializes to the JSON accepted by [`crate::SearchApi::search`], which
/// normalizes it before sending. Keys without a dedicated field go through
/// [`SearchRequest::with`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub index: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulltext_filter: Option<FulltextFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attr_filter: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_matches: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggs: Vec<Aggregation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expressions: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_scores: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchRequest {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ..Default::default()
        }
    }

    pub fn fulltext(mut self, filter: FulltextFilter) -> Self {
        self.fulltext_filter = Some(filter);
        self
    }

    /// Attribute filter: `{field, value}`, `{field, values}`, a range, a
    /// geo-distance object or a `must`/`must_not`/`should` composite
    pub fn attr_filter(mut self, filter: Value) -> Self {
        self.attr_filter = Some(filter);
        self
    }

    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn sort_by(mut self, attr: impl Into<String>, order: impl Into<String>) -> Self {
        self.sort.push(serde_json::json!({
            "attr": attr.into(),
            "order": order.into(),
        }));
        self
    }

    pub fn aggregate(mut self, aggregation: Aggregation) -> Self {
        self.aggs.push(aggregation);
        self
    }

    pub fn expression(mut self, name: impl Into<String>, expr: impl Into<String>) -> Self {
        self.expressions.push(serde_json::json!({
            "name": name.into(),
            "expr": expr.into(),
        }));
        self
    }

    pub fn highlight(mut self, highlight: Highlight) -> Self {
        self.highlight = Some(highlight);
        self
    }

    pub fn source(mut self, source: Value) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FulltextFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_fields: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_phrase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
}

impl FulltextFilter {
    /// Full query-string syntax over all fields, sent as is
    pub fn query_string(query: impl Into<String>) -> Self {
        Self {
            query_string: Some(query.into()),
            ..Default::default()
        }
    }

    pub fn matching(fields: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            query_fields: Some(fields.into()),
            query_string: Some(query.into()),
            ..Default::default()
        }
    }

    pub fn phrase(fields: impl Into<String>, phrase: impl Into<String>) -> Self {
        Self {
            query_fields: Some(fields.into()),
            query_phrase: Some(phrase.into()),
            ..Default::default()
        }
    }

    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }
}

/// Terms aggregation, sent as `{name: {terms: {field, size}}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub name: String,
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl Aggregation {
    pub fn terms(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            size: None,
        }
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<HighlightField>,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl Highlight {
    pub fn field(mut self, field: HighlightField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightField {
    pub name: String,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl HighlightField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Map::new(),
        }
    }

    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// Body of a percolate call: `{"query": {"percolate": {...}}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercolateRequest {
    pub query: Map<String, Value>,
}

impl PercolateRequest {
    pub fn document(document: Value) -> Self {
        Self::percolate("document", document)
    }

    pub fn documents(documents: Vec<Value>) -> Self {
        Self::percolate("documents", Value::Array(documents))
    }

    fn percolate(key: &str, payload: Value) -> Self {
        let mut percolate = Map::new();
        percolate.insert(key.to_string(), payload);
        let mut query = Map::new();
        query.insert("percolate".to_string(), Value::Object(percolate));
        Self { query }
    }
}

/// Response of both `search` and `percolate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub took: Option<u64>,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default)]
    pub hits: SearchHits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_relation: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub hit_type: Option<String>,
    #[serde(rename = "_id", default)]
    pub id: Value,
    #[serde(
        rename = "_score",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Value>,
}

/// Error body returned by the server on non-2xx responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error {
            Value::String(msg) => write!(f, "{}", msg),
            Value::Object(map) => match (map.get("type"), map.get("reason")) {
                (Some(Value::String(kind)), Some(Value::String(reason))) => {
                    write!(f, "{}: {}", kind, reason)
                }
                (_, Some(Value::String(reason))) => write!(f, "{}", reason),
                _ => write!(f, "{}", self.error),
            },
            other => write!(f, "{}", other),
        }
    }
}

/// Scores come back as numbers from `search` and as strings from `percolate`
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a number or numeric string, found {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_response_from_search() {
        let body = r#"{"took":10,"timed_out":false,"hits":{"total":2,"hits":[{"_id":"1","_score":1,"_source":{"gid":11}},{"_id":"2","_score":1,"_source":{"gid":12}}]}}"#;
        let response: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.took, Some(10));
        assert!(!response.timed_out);
        assert_eq!(response.hits.total, Some(2));
        assert_eq!(response.hits.hits.len(), 2);
        assert_eq!(response.hits.hits[0].id, json!("1"));
        assert_eq!(response.hits.hits[1].score, Some(1.0));
        assert_eq!(response.hits.hits[1].source, json!({"gid": 12}));
        assert!(response.hits.hits[0].index.is_none());
    }

    #[test]
    fn test_search_response_from_percolate() {
        let body = r#"{"timed_out":false,"hits":{"total":2,"max_score":1,"hits":[
            {"_index":"idx_pq_1","_type":"doc","_id":"2","_score":"1","_source":{"query":{"match":{"title":"some"}}}},
            {"_index":"idx_pq_1","_type":"doc","_id":"5","_score":"1","_source":{"query":{"ql":"some | none"}}}
        ]}}"#;
        let response: SearchResponse = serde_json::from_str(body).unwrap();
        assert!(response.took.is_none());
        assert_eq!(response.hits.max_score, Some(1.0));
        let hit = &response.hits.hits[1];
        assert_eq!(hit.index.as_deref(), Some("idx_pq_1"));
        assert_eq!(hit.hit_type.as_deref(), Some("doc"));
        assert_eq!(hit.score, Some(1.0));
        assert_eq!(hit.source, json!({"query": {"ql": "some | none"}}));
    }

    #[test]
    fn test_score_rejects_garbage() {
        let body = r#"{"hits":{"hits":[{"_id":1,"_score":"high"}]}}"#;
        assert!(serde_json::from_str::<SearchResponse>(body).is_err());
    }

    #[test]
    fn test_search_request_serializes_flat_shape() {
        let request = SearchRequest::new("movies")
            .fulltext(FulltextFilter::matching("title", "movie").operator("and"))
            .attr_filter(json!({"field": "gid", "value": 12}))
            .limit(5)
            .sort_by("price", "desc")
            .aggregate(Aggregation::terms("by_year", "year").size(3))
            .highlight(Highlight::default().field(HighlightField::new("title").option("limit", json!(20))))
            .source(json!(["title"]))
            .with("max_query_time", json!(100));

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "index": "movies",
                "fulltext_filter": {"query_string": "movie", "query_fields": "title", "operator": "and"},
                "attr_filter": {"field": "gid", "value": 12},
                "limit": 5,
                "sort": [{"attr": "price", "order": "desc"}],
                "aggs": [{"name": "by_year", "field": "year", "size": 3}],
                "highlight": {"fields": [{"name": "title", "limit": 20}]},
                "source": ["title"],
                "max_query_time": 100
            })
        );
    }

    #[test]
    fn test_percolate_request_shape() {
        let request = PercolateRequest::document(json!({"title": "some text"}));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"query": {"percolate": {"document": {"title": "some text"}}}})
        );
        let request = PercolateRequest::documents(vec![json!({"a": 1}), json!({"a": 2})]);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"query": {"percolate": {"documents": [{"a": 1}, {"a": 2}]}}})
        );
    }

    #[test]
    fn test_error_response_display() {
        let error: ErrorResponse =
            serde_json::from_str(r#"{"error":"unknown local index 'x'"}"#).unwrap();
        assert_eq!(error.to_string(), "unknown local index 'x'");

        let error: ErrorResponse = serde_json::from_str(
            r#"{"error":{"type":"parse_exception","reason":"bad query"},"status":400}"#,
        )
        .unwrap();
        assert_eq!(error.status, Some(400));
        assert_eq!(error.to_string(), "parse_exception: bad query");
    }
}
