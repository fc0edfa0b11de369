//! HTTP boundary errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::error::TelegramError;
use crate::stats::InvalidQuery;

/// Message returned for any invalid query.
pub const VALIDATION_MESSAGE: &str = "Thiếu tham số peer hoặc id";

/// Message returned for any internal failure.
pub const INTERNAL_MESSAGE: &str = "Đã xảy ra lỗi khi xử lý yêu cầu";

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human readable error message.
    pub error: String,
}

/// Errors surfaced by HTTP handlers.
///
/// Only validation errors carry a caller-facing message; everything else
/// becomes the same generic 500 body and is logged server side.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed query parameters.
    #[error("invalid query: {0}")]
    Validation(#[from] InvalidQuery),

    /// Session or remote call failure.
    #[error(transparent)]
    Telegram(#[from] TelegramError),

    /// Anything else.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Telegram(_) | Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => VALIDATION_MESSAGE,
            Self::Telegram(_) | Self::Unexpected(_) => INTERNAL_MESSAGE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Failed to process message stats request");
        } else {
            tracing::debug!(error = %self, "Rejected message stats request");
        }

        let body = Json(ErrorResponse {
            error: self.public_message().to_string(),
        });

        (status, body).into_response()
    }
}
