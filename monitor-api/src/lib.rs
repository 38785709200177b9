pub mod handlers;
pub mod render;
pub mod server;
pub mod state;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use monitor_core::MonitorError;

const UNKNOWN_ERROR: &str = "unknown error";

/// Request-level failure, returned to the client as `text/plain`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = if self.message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            self.message
        };
        (
            self.status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        Self::internal(err.to_string())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
