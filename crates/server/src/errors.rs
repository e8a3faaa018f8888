use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use service::PriceError;
use thiserror::Error;
use tracing::error;

/// Message sent to API clients on any price fetch failure; the cause is
/// only logged.
pub const FETCH_FAILED: &str = "Failed to fetch prices";

#[derive(Debug)]
pub struct ApiError(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        (status, Json(ErrorBody::new(self.0))).into_response()
    }
}

impl From<PriceError> for ApiError {
    fn from(e: PriceError) -> Self {
        error!(code = e.code(), error = %e, "error in /api/prices");
        ApiError(FETCH_FAILED.to_string())
    }
}

/// HTML error page with a status code.
#[derive(Debug)]
pub struct PageError {
    pub status: StatusCode,
    pub html: String,
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        (self.status, Html(self.html)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("runtime check failed: {0}")]
    Runtime(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
