use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::models::ErrorResponse;

const JSON: &str = "application/json";

/// Parsed response body together with the HTTP status and headers
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub headers: HeaderMap,
    pub data: T,
}

/// Thin JSON-over-HTTP transport shared by the API wrappers
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| {
            ClientError::Config(format!("Invalid base URL '{}': {}", config.base_url, e))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON));
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::Config(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                ClientError::Config(format!("Invalid value for header '{}': {}", name, e))
            })?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` as JSON to `path` and parse a JSON response
    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, JSON)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;
        debug!(%url, status = status.as_u16(), bytes = text.len(), "Response received");

        if !status.is_success() {
            let error = serde_json::from_str::<ErrorResponse>(&text).ok();
            return Err(ClientError::Api {
                status: status.as_u16(),
                body: text,
                error,
            });
        }

        let data = serde_json::from_str(&text)
            .map_err(|source| ClientError::Deserialize { body: text, source })?;

        Ok(ApiResponse {
            status: status.as_u16(),
            headers,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::{json, Value};

    fn client_for(url: &str) -> ApiClient {
        ApiClient::new(&ClientConfig::default().with_base_url(url)).unwrap()
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = client_for("http://localhost:9308/");
        assert_eq!(client.base_url(), "http://localhost:9308");
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let result = ApiClient::new(&ClientConfig::default().with_base_url("not a url"));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_new_rejects_invalid_header() {
        let mut config = ClientConfig::default();
        config
            .headers
            .insert("bad header".to_string(), "x".to_string());
        let result = ApiClient::new(&config);
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[tokio::test]
    async fn test_post_json_sends_headers_and_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/json/test")
            .match_header("content-type", "application/json")
            .match_header("accept", "application/json")
            .match_header("x-tenant", "movies")
            .match_body(Matcher::Json(json!({"a": 1})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("x-took", "3")
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let mut config = ClientConfig::default().with_base_url(server.url());
        config
            .headers
            .insert("X-Tenant".to_string(), "movies".to_string());
        let client = ApiClient::new(&config).unwrap();

        let response: ApiResponse<Value> = client.post_json("/json/test", &json!({"a": 1})).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.data, json!({"ok": true}));
        assert_eq!(
            response.headers.get("x-took").and_then(|v| v.to_str().ok()),
            Some("3")
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_json_api_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/json/test")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"unknown local index 'nope'","status":400}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let result: Result<ApiResponse<Value>, _> = client.post_json("/json/test", &json!({})).await;
        match result {
            Err(ClientError::Api {
                status,
                error: Some(error),
                ..
            }) => {
                assert_eq!(status, 400);
                assert_eq!(error.to_string(), "unknown local index 'nope'");
            }
            other => panic!("Expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_post_json_non_json_error_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/json/test")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let result: Result<ApiResponse<Value>, _> = client.post_json("/json/test", &json!({})).await;
        match result {
            Err(ClientError::Api {
                status,
                body,
                error,
            }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
                assert!(error.is_none());
            }
            other => panic!("Expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_post_json_bad_success_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/json/test")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let result: Result<ApiResponse<Value>, _> = client.post_json("/json/test", &json!({})).await;
        assert!(matches!(result, Err(ClientError::Deserialize { .. })));
    }

    #[tokio::test]
    async fn test_post_json_connection_refused() {
        // Port 9 (discard) is not expected to accept HTTP connections
        let client = client_for("http://127.0.0.1:9");
        let result: Result<ApiResponse<Value>, _> = client.post_json("/json/test", &json!({})).await;
        assert!(matches!(result, Err(ClientError::Transport(_))));
    }
}
