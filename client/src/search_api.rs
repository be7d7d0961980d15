use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::api_client::{ApiClient, ApiResponse};
use crate::errors::ClientError;
use crate::models::SearchResponse;
use crate::normalize;

/// Search service: `/json/search` and `/json/pq/{index}/search`
#[derive(Debug, Clone)]
pub struct SearchApi {
    client: ApiClient,
}

impl SearchApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Perform a search.
    ///
    /// `request` may be a [`crate::SearchRequest`] or any JSON object. Its
    /// convenience keys (`fulltext_filter`, `attr_filter`, labeled `sort`,
    /// `aggs`, `expressions` and `highlight.fields` entries, `source`) are
    /// rewritten into the engine's query shape before sending.
    pub async fn search<R>(&self, request: &R) -> Result<SearchResponse, ClientError>
    where
        R: Serialize + ?Sized,
    {
        Ok(self.search_with_http_info(request).await?.data)
    }

    pub async fn search_with_http_info<R>(
        &self,
        request: &R,
    ) -> Result<ApiResponse<SearchResponse>, ClientError>
    where
        R: Serialize + ?Sized,
    {
        let body = prepare_search_body(request)?;
        self.client.post_json("/json/search", &body).await
    }

    /// Perform a reverse search on a percolate index.
    ///
    /// The request is sent as is, e.g.
    /// `{"query":{"percolate":{"document":{"content":"sample content"}}}}`;
    /// the matching stored queries come back as hits.
    pub async fn percolate<R>(&self, index: &str, request: &R) -> Result<SearchResponse, ClientError>
    where
        R: Serialize + ?Sized,
    {
        Ok(self.percolate_with_http_info(index, request).await?.data)
    }

    pub async fn percolate_with_http_info<R>(
        &self,
        index: &str,
        request: &R,
    ) -> Result<ApiResponse<SearchResponse>, ClientError>
    where
        R: Serialize + ?Sized,
    {
        let path = percolate_path(index)?;
        let body = serde_json::to_value(request)?;
        if body.is_null() {
            return Err(ClientError::missing("percolateRequest", "percolate"));
        }
        self.client.post_json(&path, &body).await
    }
}

/// Serialize and normalize a search body without sending it
pub fn prepare_search_body<R>(request: &R) -> Result<Value, ClientError>
where
    R: Serialize + ?Sized,
{
    let body = serde_json::to_value(request)?;
    if body.is_null() {
        return Err(ClientError::missing("searchRequest", "search"));
    }
    let body = normalize::normalized(body)?;
    debug!(body = %body, "Normalized search request");
    Ok(body)
}

fn percolate_path(index: &str) -> Result<String, ClientError> {
    if index.trim().is_empty() {
        return Err(ClientError::missing("index", "percolate"));
    }
    Ok(format!("/json/pq/{}/search", urlencoding::encode(index)))
}
