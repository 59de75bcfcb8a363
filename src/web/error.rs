//! HTTP mapping for storefront errors.
//!
//! Client errors carry their message; server-side failures are logged and answered
//! with a generic message so internals never leak into responses.

use crate::errors::Error;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

impl Error {
    /// HTTP status this error is reported with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ProductNotFound { .. }
            | Self::OrderNotFound { .. }
            | Self::CustomerNotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidInput { .. }
            | Self::InvalidAmount { .. }
            | Self::UnknownCartAction { .. } => StatusCode::BAD_REQUEST,
            Self::TotalMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::OrderAlreadyComplete { .. } => StatusCode::CONFLICT,
            Self::Payment { .. } => StatusCode::BAD_GATEWAY,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) | Self::EnvVar(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_input(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            match self {
                Self::Payment { .. } => "Payment service error".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            tracing::debug!(error = %self, "Request rejected");
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
