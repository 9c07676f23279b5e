//! Validated load test targets

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// A URL to load test together with its normalized hostname.
///
/// Targets order by host, then URL, which keeps reports and host rollups deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Target {
    host: String,
    url: String,
}

impl Target {
    /// Parse and validate a raw URL.
    ///
    /// Rejects empty input, malformed URLs, URLs without a host and schemes other
    /// than `http` / `https`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CoreError::EmptyUrl);
        }

        let parsed = Url::parse(raw).map_err(|e| CoreError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(CoreError::UnsupportedScheme {
                    url: raw.to_string(),
                    scheme: other.to_string(),
                })
            }
        }

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| CoreError::MissingHost(raw.to_string()))?
            .to_ascii_lowercase();

        Ok(Self {
            host,
            url: raw.to_string(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FromStr for Target {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Target::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
