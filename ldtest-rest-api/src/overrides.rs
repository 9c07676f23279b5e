//! Per-request configuration overrides
//!
//! Every setting can be overridden by a request header or a query parameter.
//! A header beats the query parameter, which beats the static configuration.

use crate::errors::{RestError, RestResult};
use axum::http::HeaderMap;
use ldtest_core::{ConfigOverrides, HttpMethod};
use serde::Deserialize;
use std::time::Duration;

/// Settings that can be overridden per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideField {
    MaxIdleConnPerHost,
    RequestTimeout,
    DisableCompression,
    DisableKeepAlive,
    Method,
    Accept,
    UserAgent,
}

impl OverrideField {
    pub const ALL: [OverrideField; 7] = [
        OverrideField::MaxIdleConnPerHost,
        OverrideField::RequestTimeout,
        OverrideField::DisableCompression,
        OverrideField::DisableKeepAlive,
        OverrideField::Method,
        OverrideField::Accept,
        OverrideField::UserAgent,
    ];

    pub fn header_name(&self) -> &'static str {
        match self {
            OverrideField::MaxIdleConnPerHost => "T-Max-Idle-Conn-Host",
            OverrideField::RequestTimeout => "T-Req-Timeout",
            OverrideField::DisableCompression => "T-Disable-Compress",
            OverrideField::DisableKeepAlive => "T-Disable-Keep-Alive",
            OverrideField::Method => "T-Method",
            OverrideField::Accept => "T-Accept",
            OverrideField::UserAgent => "T-User-Agent",
        }
    }

    pub fn query_name(&self) -> &'static str {
        match self {
            OverrideField::MaxIdleConnPerHost => "tmaxidleconnhost",
            OverrideField::RequestTimeout => "treqtimeout",
            OverrideField::DisableCompression => "tdisablecompress",
            OverrideField::DisableKeepAlive => "tdisablekeepalive",
            OverrideField::Method => "tmethod",
            OverrideField::Accept => "taccept",
            OverrideField::UserAgent => "tuseragent",
        }
    }
}

/// Query string of `POST /load`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadQuery {
    pub tmaxidleconnhost: Option<String>,
    pub treqtimeout: Option<String>,
    pub tdisablecompress: Option<String>,
    pub tdisablekeepalive: Option<String>,
    pub tmethod: Option<String>,
    pub taccept: Option<String>,
    pub tuseragent: Option<String>,
    /// `host` rolls results up per host
    pub group_by: Option<String>,
}

impl LoadQuery {
    fn get(&self, field: OverrideField) -> Option<&str> {
        let value = match field {
            OverrideField::MaxIdleConnPerHost => &self.tmaxidleconnhost,
            OverrideField::RequestTimeout => &self.treqtimeout,
            OverrideField::DisableCompression => &self.tdisablecompress,
            OverrideField::DisableKeepAlive => &self.tdisablekeepalive,
            OverrideField::Method => &self.tmethod,
            OverrideField::Accept => &self.taccept,
            OverrideField::UserAgent => &self.tuseragent,
        };
        value.as_deref()
    }

    /// Whether results should be rolled up per host
    pub fn group_by_host(&self) -> RestResult<bool> {
        match self.group_by.as_deref().map(str::trim) {
            None | Some("") => Ok(false),
            Some(g) if g.eq_ignore_ascii_case("host") => Ok(true),
            Some(other) => Err(RestError::bad_request(format!(
                "unsupported group_by value {:?}, expected \"host\"",
                other
            ))),
        }
    }
}

/// Resolve the header layer over the query layer
pub fn resolve(headers: &HeaderMap, query: &LoadQuery) -> RestResult<ConfigOverrides> {
    let from_headers = parse_layer(|field| {
        headers
            .get(field.header_name())
            .map(|value| {
                value.to_str().map_err(|_| {
                    RestError::bad_request(format!(
                        "header {} is not valid UTF-8",
                        field.header_name()
                    ))
                })
            })
            .transpose()
    }, OverrideField::header_name)?;

    let from_query = parse_layer(|field| Ok(query.get(field)), OverrideField::query_name)?;

    Ok(from_headers.or(from_query))
}

fn parse_layer<'a, F>(
    mut lookup: F,
    name_of: fn(&OverrideField) -> &'static str,
) -> RestResult<ConfigOverrides>
where
    F: FnMut(OverrideField) -> RestResult<Option<&'a str>>,
{
    let mut overrides = ConfigOverrides::default();

    for field in OverrideField::ALL {
        let Some(raw) = lookup(field)?.map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        let name = name_of(&field);

        match field {
            OverrideField::MaxIdleConnPerHost => {
                overrides.max_idle_conns_per_host = Some(parse_positive(name, raw)? as usize);
            }
            OverrideField::RequestTimeout => {
                overrides.timeout = Some(Duration::from_secs(parse_positive(name, raw)?));
            }
            OverrideField::DisableCompression => {
                overrides.disable_compression = Some(parse_flag(raw));
            }
            OverrideField::DisableKeepAlive => {
                overrides.disable_keep_alive = Some(parse_flag(raw));
            }
            OverrideField::Method => {
                let method: HttpMethod = raw
                    .parse()
                    .map_err(|_| RestError::bad_request(format!("invalid {}: {}", name, raw)))?;
                overrides.method = Some(method);
            }
            OverrideField::Accept => overrides.accept_header = Some(raw.to_string()),
            OverrideField::UserAgent => overrides.user_agent = Some(raw.to_string()),
        }
    }

    Ok(overrides)
}

fn parse_positive(name: &str, raw: &str) -> RestResult<u64> {
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(RestError::bad_request(format!(
            "invalid {}: {} (expected a positive integer)",
            name, raw
        ))),
    }
}

/// Any non-empty value switches a flag on, except an explicit negative
fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}
