//! Error types for ecop-annotator
//!
//! Every error renders as an HTML page; this service has no JSON clients
//! besides the health check.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::api::ui::pages;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Poem or title cannot be resolved (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Poem not assigned to the session user (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing or mismatched CSRF token (400)
    #[error("The form's security token is missing or invalid")]
    InvalidCsrfToken,

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// ecop-common error
    #[error(transparent)]
    Common(#[from] ecop_common::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidCsrfToken => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Common(ecop_common::Error::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Common(ecop_common::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Common(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected ({}): {}", status.as_u16(), self);
        }

        let page = match self {
            ApiError::InvalidCsrfToken => pages::csrf_error_page(),
            ref other => pages::error_page(status, &other.to_string()),
        };

        (status, Html(page)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
