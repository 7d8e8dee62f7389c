//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>` and build the error with
//! [`HttpAppError::new`], passing the configured environment. It renders as a JSON
//! [`ErrorResponse`] with the status the error's metadata names.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use imgflux_core::{AppError, ErrorMetadata, LogLevel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether the same request may succeed when retried
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper so the foreign `IntoResponse` trait can be implemented for `AppError`
#[derive(Debug)]
pub struct HttpAppError {
    pub error: AppError,
    /// Hide sensitive error text and details
    pub is_production: bool,
}

impl HttpAppError {
    pub fn new(error: AppError, is_production: bool) -> Self {
        Self {
            error,
            is_production,
        }
    }

    fn body(&self) -> ErrorResponse {
        let app_error = &self.error;
        let error = if self.is_production && app_error.is_sensitive() {
            app_error.client_message()
        } else {
            app_error.to_string()
        };

        ErrorResponse {
            error,
            details: (!self.is_production).then(|| format!("{:?}", app_error)),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        }
    }
}

/// Errors raised without access to the config are treated as production.
impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError::new(err, true)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError::new(AppError::from(err), true)
    }
}

fn log_error(error: &AppError) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, code = code, "Request rejected");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, code = code, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, code = code, "Request failed");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(&self.error);

        (status, Json(self.body())).into_response()
    }
}
