use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Read;

/// Read a JSON document from a file path, or from stdin when `source` is `-`
pub fn read_json(source: &str) -> Result<Value> {
    let text = if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read request body from stdin")?;
        text
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read request body from {}", source))?
    };
    parse_json(&text, source)
}

pub fn parse_json(text: &str, origin: &str) -> Result<Value> {
    let origin = if origin == "-" { "stdin" } else { origin };
    serde_json::from_str(text).with_context(|| format!("Invalid JSON in {}", origin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_json_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("request.json");
        fs::write(&path, r#"{"index":"movies","limit":3}"#).unwrap();

        let value = read_json(path.to_str().unwrap()).unwrap();
        assert_eq!(value, json!({"index": "movies", "limit": 3}));
    }

    #[test]
    fn test_read_json_missing_file() {
        let err = read_json("/nonexistent/request.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read request body"));
    }

    #[test]
    fn test_parse_json_reports_origin() {
        let err = parse_json("{not json", "-").unwrap_err();
        assert_eq!(err.to_string(), "Invalid JSON in stdin");
        let err = parse_json("", "body.json").unwrap_err();
        assert_eq!(err.to_string(), "Invalid JSON in body.json");
    }
}
