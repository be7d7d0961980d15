use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:9308";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Static headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
            headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            ClientError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Defaults overridden by `MANTICORE_URL` and `MANTICORE_TIMEOUT_SECONDS`
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let mut config = Self::default();
        if let Some(url) = lookup("MANTICORE_URL") {
            config.base_url = url;
        }
        if let Some(timeout) = lookup("MANTICORE_TIMEOUT_SECONDS") {
            config.timeout_seconds = timeout.trim().parse().map_err(|_| {
                ClientError::Config(format!(
                    "MANTICORE_TIMEOUT_SECONDS must be a number, got '{}'",
                    timeout
                ))
            })?;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

// Default functions
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("manticoresearch-rust/{}", env!("CARGO_PKG_VERSION"))
}
