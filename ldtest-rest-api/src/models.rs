//! Request and response bodies

use ldtest_core::{LoadTestConfig, TargetStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of the `POST /load` body: a bare URL or an object with a `url` field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetItem {
    Url(String),
    Object { url: String },
}

impl TargetItem {
    pub fn url(&self) -> &str {
        match self {
            TargetItem::Url(url) | TargetItem::Object { url } => url,
        }
    }
}

/// Response envelope of `POST /load`, used for errors too
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_test_config: Option<LoadTestConfig>,
    /// Statistics keyed by URL, or by host when grouped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, TargetStats>>,
}

impl LoadResponse {
    pub fn success(config: LoadTestConfig, data: BTreeMap<String, TargetStats>) -> Self {
        Self {
            message: "successfully".to_string(),
            load_test_config: Some(config),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            load_test_config: None,
            data: None,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cached_results: usize,
}

impl HealthResponse {
    pub fn healthy(cached_results: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            cached_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_items_accept_both_shapes() {
        let items: Vec<TargetItem> =
            serde_json::from_str(r#"["http://a.test/", {"url": "http://b.test/"}]"#).unwrap();
        let urls: Vec<_> = items.iter().map(TargetItem::url).collect();
        assert_eq!(urls, ["http://a.test/", "http://b.test/"]);

        assert!(serde_json::from_str::<Vec<TargetItem>>(r#"[{"href": "x"}]"#).is_err());
    }

    #[test]
    fn test_failure_envelope_omits_empty_fields() {
        let json = serde_json::to_value(LoadResponse::failure("bad input")).unwrap();
        assert_eq!(json, serde_json::json!({"message": "bad input"}));
    }
}
