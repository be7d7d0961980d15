use crate::models::ErrorResponse;

/// Errors returned by the client and the request normalizer
#[derive(Debug)]
pub enum ClientError {
    MissingParameter {
        param: &'static str,
        operation: &'static str,
    },
    InvalidRequest(String),
    InvalidFilter(String),
    InvalidNode(String),
    Transport(reqwest::Error),
    Api {
        status: u16,
        body: String,
        error: Option<ErrorResponse>,
    },
    Deserialize {
        body: String,
        source: serde_json::Error,
    },
    Serialize(serde_json::Error),
    Config(String),
}

impl ClientError {
    pub(crate) fn missing(param: &'static str, operation: &'static str) -> Self {
        ClientError::MissingParameter { param, operation }
    }

    /// HTTP status of an API error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialize(err)
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::MissingParameter { param, operation } => write!(
                f,
                "Missing the required parameter '{}' when calling {}",
                param, operation
            ),
            ClientError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ClientError::InvalidFilter(msg) => write!(f, "Invalid filter: {}", msg),
            ClientError::InvalidNode(msg) => write!(f, "Invalid node: {}", msg),
            ClientError::Transport(err) => write!(f, "HTTP transport error: {}", err),
            ClientError::Api {
                status,
                body,
                error,
            } => match error {
                Some(err) => write!(f, "API error {}: {}", status, err),
                None => write!(f, "API error {}: {}", status, body),
            },
            ClientError::Deserialize { body, source } => {
                write!(f, "Failed to deserialize response: {} (body: {})", source, body)
            }
            ClientError::Serialize(err) => write!(f, "Failed to serialize request: {}", err),
            ClientError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Transport(err) => Some(err),
            ClientError::Deserialize { source, .. } => Some(source),
            ClientError::Serialize(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_display() {
        let error = ClientError::missing("index", "percolate");
        assert_eq!(
            error.to_string(),
            "Missing the required parameter 'index' when calling percolate"
        );
        assert!(error.status().is_none());
    }

    #[test]
    fn test_api_error_prefers_parsed_error() {
        let error = ClientError::Api {
            status: 400,
            body: r#"{"error":"unknown local index 'nope'"}"#.to_string(),
            error: Some(ErrorResponse {
                error: serde_json::json!("unknown local index 'nope'"),
                status: Some(400),
            }),
        };
        let msg = error.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("unknown local index 'nope'"));
        assert!(!msg.contains('{'));
        assert_eq!(error.status(), Some(400));
    }

    #[test]
    fn test_api_error_falls_back_to_body() {
        let error = ClientError::Api {
            status: 502,
            body: "Bad Gateway".to_string(),
            error: None,
        };
        assert_eq!(error.to_string(), "API error 502: Bad Gateway");
    }

    #[test]
    fn test_deserialize_error_has_source() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = ClientError::Deserialize {
            body: "{".to_string(),
            source,
        };
        assert!(std::error::Error::source(&error).is_some());
    }
}
