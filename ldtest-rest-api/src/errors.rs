//! REST API error types

use crate::models::LoadResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ldtest_core::CoreError;
use ldtest_engine::EngineError;
use ldtest_http::HttpError;
use thiserror::Error;
use tracing::error;

/// REST API specific error type
#[derive(Error, Debug)]
pub enum RestError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

impl RestError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        RestError::BadRequest(message.into())
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        RestError::InternalError(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RestError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Load request failed: {}", self);
        }

        (status, Json(LoadResponse::failure(self.to_string()))).into_response()
    }
}

impl From<CoreError> for RestError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Serialization(e) => RestError::InternalError(e.to_string()),
            other => RestError::BadRequest(other.to_string()),
        }
    }
}

impl From<EngineError> for RestError {
    fn from(err: EngineError) -> Self {
        match &err {
            EngineError::Executor {
                source: HttpError::InvalidHeader { .. },
                ..
            } => RestError::BadRequest(err.to_string()),
            _ => RestError::InternalError(err.to_string()),
        }
    }
}
