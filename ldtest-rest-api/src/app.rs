//! Main application configuration and router setup

use axum::{
    routing::{get, post},
    Router,
};
use ldtest_config::LdtestConfig;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

use crate::{context::LoadContext, handlers};

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Enable CORS middleware
    pub enable_cors: bool,
    /// Enable request tracing
    pub enable_tracing: bool,
    /// Upper bound for a whole request, including the load run
    pub request_timeout: Duration,
    /// Upper bound for receiving the request body
    pub body_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            enable_cors: false,
            enable_tracing: true,
            request_timeout: Duration::from_secs(60),
            body_timeout: Duration::from_secs(30),
        }
    }
}

impl AppConfig {
    /// Leave room for a full stress test run plus writing the response
    pub fn from_config(config: &LdtestConfig) -> Self {
        Self {
            request_timeout: config
                .load_test
                .stress_test_timeout
                .saturating_add(config.server.write_timeout),
            body_timeout: config.server.read_timeout,
            ..Default::default()
        }
    }
}

/// Create the REST application
pub fn create_rest_app(context: LoadContext, config: AppConfig) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/load", post(handlers::load_handler))
        .with_state(context)
        .layer(RequestBodyTimeoutLayer::new(config.body_timeout))
        .layer(TimeoutLayer::new(config.request_timeout));

    if config.enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    if config.enable_tracing {
        app = app.layer(TraceLayer::new_for_http());
    }

    app
}
