//! Outbound request headers.
//!
//! A run builds its [`HeaderSet`] once: the defaults (each overridable from
//! the environment through [`HeaderDefaults`]) overlaid with the optional
//! `headers.json` file in the data directory.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, instrument, warn};

pub const HEADERS_FILE_NAME: &str = "headers.json";

/// Environment-supplied values for the default header set.
#[derive(Debug, Clone)]
pub struct HeaderDefaults {
    pub accept: String,
    pub accept_language: String,
    pub accept_encoding: String,
    pub cookie: String,
    pub user_agent: String,
}

/// Lower-cased header name to trimmed, non-empty value.
///
/// Backed by a `BTreeMap` so the same inputs always produce the same
/// header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet(BTreeMap<String, String>);

impl HeaderSet {
    /// The default browser-like header set.
    pub fn from_defaults(defaults: &HeaderDefaults) -> Self {
        let pairs = [
            ("accept", defaults.accept.as_str()),
            ("accept-language", defaults.accept_language.as_str()),
            ("accept-encoding", defaults.accept_encoding.as_str()),
            ("connection", "keep-alive"),
            ("cookie", defaults.cookie.as_str()),
            ("upgrade-insecure-requests", "1"),
            ("sec-fetch-dest", "document"),
            ("sec-fetch-mode", "navigate"),
            ("sec-fetch-site", "none"),
            ("priority", "u=0, i"),
            ("user-agent", defaults.user_agent.as_str()),
        ];

        let map = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.trim().to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        HeaderSet(map)
    }

    /// Overlay `overrides` key by key.
    ///
    /// Keys are lower-cased and trimmed; only non-empty string values
    /// replace a default. Everything else in the map is ignored.
    pub fn with_overrides(mut self, overrides: &Map<String, Value>) -> Self {
        for (key, value) in overrides {
            let key = key.trim().to_lowercase();
            let Some(value) = value.as_str().map(str::trim) else {
                continue;
            };
            if key.is_empty() || value.is_empty() {
                continue;
            }
            self.0.insert(key, value.to_string());
        }
        self.0.retain(|_, v| !v.is_empty());
        self
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// Convert into a request header map, skipping invalid names or values.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.0.len());
        for (name, value) in &self.0 {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    map.insert(name, value);
                }
                _ => warn!(header = %name, "Skipping invalid request header"),
            }
        }
        map
    }
}

/// Read header overrides from a JSON object on disk.
///
/// A missing, unreadable, malformed or non-object file yields an empty map.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn load_overrides(path: &Path) -> Map<String, Value> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = %e, "No header overrides loaded");
            return Map::new();
        }
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => {
            debug!(count = map.len(), "Loaded header overrides");
            map
        }
        Ok(_) => {
            debug!("Header override file is not a JSON object; ignoring");
            Map::new()
        }
        Err(e) => {
            debug!(error = %e, "Header override file is not valid JSON; ignoring");
            Map::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> HeaderDefaults {
        HeaderDefaults {
            accept: "text/html".to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            accept_encoding: "deflate".to_string(),
            cookie: String::new(),
            user_agent: "TestAgent/1.0".to_string(),
        }
    }

    fn overrides(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_defaults_drop_empty_values() {
        let headers = HeaderSet::from_defaults(&defaults());
        assert_eq!(headers.get("user-agent"), Some("TestAgent/1.0"));
        assert_eq!(headers.get("cookie"), None);
        assert_eq!(headers.get("accept-encoding"), Some("deflate"));
    }

    #[test]
    fn test_overrides_lowercase_and_trim() {
        let headers = HeaderSet::from_defaults(&defaults()).with_overrides(&overrides(json!({
            "User-Agent": "  Custom/2.0 ",
            "Cookie": "geo=US",
        })));
        assert_eq!(headers.get("user-agent"), Some("Custom/2.0"));
        assert_eq!(headers.get("cookie"), Some("geo=US"));
    }

    #[test]
    fn test_overrides_ignore_empty_and_non_string() {
        let headers = HeaderSet::from_defaults(&defaults()).with_overrides(&overrides(json!({
            "accept": "   ",
            "priority": 5,
            "x-debug": null,
        })));
        assert_eq!(headers.get("accept"), Some("text/html"));
        assert_eq!(headers.get("priority"), Some("u=0, i"));
        assert_eq!(headers.get("x-debug"), None);
    }

    #[test]
    fn test_build_is_deterministic() {
        let extra = overrides(json!({"X-Token": "abc", "Accept": "*/*"}));
        let a = HeaderSet::from_defaults(&defaults()).with_overrides(&extra);
        let b = HeaderSet::from_defaults(&defaults()).with_overrides(&extra);
        assert_eq!(a, b);
        assert_eq!(
            a.as_map().keys().collect::<Vec<_>>(),
            b.as_map().keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_header_map_skips_invalid_entries() {
        let headers = HeaderSet::from_defaults(&defaults()).with_overrides(&overrides(json!({
            "bad header": "value",
        })));
        let map = headers.to_header_map();
        assert_eq!(map.len(), headers.len() - 1);
        assert_eq!(map.get("user-agent").unwrap(), "TestAgent/1.0");
    }

    #[tokio::test]
    async fn test_load_overrides_missing_or_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(HEADERS_FILE_NAME);
        assert!(load_overrides(&path).await.is_empty());

        tokio::fs::write(&path, "{not json").await.unwrap();
        assert!(load_overrides(&path).await.is_empty());

        tokio::fs::write(&path, "[1, 2]").await.unwrap();
        assert!(load_overrides(&path).await.is_empty());

        tokio::fs::write(&path, r#"{"Accept": "text/plain"}"#).await.unwrap();
        let map = load_overrides(&path).await;
        assert_eq!(map.get("Accept").and_then(Value::as_str), Some("text/plain"));
    }
}
