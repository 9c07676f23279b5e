//! HTTP request execution for ldtest
//!
//! This crate performs single instrumented requests against a target and classifies
//! their outcome. The engine depends only on the [`RequestExecutor`] and
//! [`ExecutorFactory`] traits; [`HttpExecutorFactory`] is the reqwest-backed
//! implementation used by the CLI and the service.

pub mod client;
pub mod errors;
pub mod executor;
pub mod timing;

// Re-export main types for convenience
pub use client::{HttpExecutor, HttpExecutorFactory, CLIENT_TIMEOUT};
pub use errors::HttpError;
pub use executor::{ExecutorFactory, RequestExecutor, RoundContext};
