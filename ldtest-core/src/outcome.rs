//! Results of individual request attempts

use crate::target::Target;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Why a request attempt did not produce a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connection, TLS, protocol or body errors
    Network,
    /// The run was cancelled while the request was in flight
    DeadlineExceeded,
    /// The HTTP client's own timeout elapsed
    OsTimeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Network => "network",
            FailureKind::DeadlineExceeded => "deadline_exceeded",
            FailureKind::OsTimeout => "os_timeout",
        };
        f.write_str(name)
    }
}

/// Phase durations measured from the start of a request.
///
/// Phases that could not be observed (for example DNS and connect on a reused
/// pooled connection) stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub dns: Duration,
    pub connect: Duration,
    pub write: Duration,
    pub ttfb: Duration,
    pub read: Duration,
}

/// Outcome of exactly one request attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOutcome {
    pub target: Target,
    /// Offset of the request start from the start of its round
    pub round_offset: Duration,
    /// Present whenever a response head was received
    pub status_code: Option<u16>,
    pub total: Duration,
    pub phases: PhaseTimings,
    pub error: Option<FailureKind>,
    /// Concurrency level of the round that issued the request
    pub concurrency: usize,
}

impl RequestOutcome {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
