//! # ldtest REST API
//!
//! HTTP boundary for on-demand load runs. `POST /load` accepts a list of URLs,
//! resolves the run configuration from static settings plus per-request overrides,
//! serves fresh-enough results from the result cache and load tests the rest.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ldtest_caching::ResultCache;
//! use ldtest_config::LdtestConfig;
//! use ldtest_http::HttpExecutorFactory;
//! use ldtest_rest_api::{create_rest_app, AppConfig, LoadContext};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LdtestConfig::default();
//! let cache = Arc::new(ResultCache::new());
//! let context = LoadContext::from_config(&config, cache, Arc::new(HttpExecutorFactory))?;
//! let app = create_rest_app(context, AppConfig::from_config(&config));
//!
//! let listener = tokio::net::TcpListener::bind(config.server.socket_addr()).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod context;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod overrides;

// Re-export commonly used types
pub use app::{create_rest_app, AppConfig};
pub use context::LoadContext;
pub use errors::{RestError, RestResult};
pub use models::{HealthResponse, LoadResponse, TargetItem};
