//! Error types module
//!
//! Every failure a transform request can hit is represented by [`AppError`]. Each variant
//! describes itself through [`ErrorMetadata`] so the HTTP layer can pick a status code,
//! a machine-readable code and a log level without matching on variants itself.

use std::time::Duration;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for upstream or input problems outside our control
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "FETCH_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same request may succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Message shown in production when the error is sensitive
    fn client_message(&self) -> String;

    /// Whether the error text is replaced by [`ErrorMetadata::client_message`] in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Image is not exists.")]
    MissingSource,

    #[error("Invalid parameter '{field}': {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("Failed to fetch source image after {attempts} attempt(s): {message}")]
    FetchFailed { attempts: u32, message: String },

    #[error("Transformation failed: {0}")]
    TransformFailed(String),

    #[error("Worker stopped abnormally: {0}")]
    WorkerCrashed(String),

    #[error("Worker communication failed: {0}")]
    WorkerCommFailure(String),

    #[error("Worker did not reply within {}ms", .0.as_millis())]
    WorkerTimeout(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid_parameter(field: &'static str, reason: impl Into<String>) -> Self {
        AppError::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{:#}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::MissingSource => (
            400,
            "MISSING_SOURCE",
            false,
            Some("Pass the source image location in the 'url' query parameter"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidParameter { .. } => (
            400,
            "INVALID_PARAMETER",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::FetchFailed { .. } => (
            502,
            "FETCH_FAILED",
            true,
            Some("Verify the source URL is reachable and retry"),
            false,
            LogLevel::Warn,
        ),
        AppError::TransformFailed(_) => (
            422,
            "TRANSFORM_FAILED",
            false,
            Some("Check the source image and the requested operations"),
            false,
            LogLevel::Warn,
        ),
        AppError::WorkerCrashed(_) => (
            500,
            "WORKER_CRASHED",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::WorkerCommFailure(_) => (
            500,
            "WORKER_COMM_FAILURE",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::WorkerTimeout(_) => (
            504,
            "WORKER_TIMEOUT",
            true,
            Some("Request a smaller output or fewer operations"),
            false,
            LogLevel::Warn,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::WorkerCrashed(_) | AppError::WorkerCommFailure(_) => {
                "Image worker failed unexpectedly".to_string()
            }
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_distinct_per_failure_class() {
        assert_eq!(AppError::MissingSource.http_status_code(), 400);
        assert_eq!(
            AppError::invalid_parameter("size", "bad").http_status_code(),
            400
        );
        assert_eq!(
            AppError::FetchFailed {
                attempts: 3,
                message: "status 500".into()
            }
            .http_status_code(),
            502
        );
        assert_eq!(
            AppError::TransformFailed("decode".into()).http_status_code(),
            422
        );
        assert_eq!(
            AppError::WorkerCrashed("boom".into()).http_status_code(),
            500
        );
        assert_eq!(
            AppError::WorkerTimeout(Duration::from_secs(1)).http_status_code(),
            504
        );
    }

    #[test]
    fn test_missing_source_message() {
        assert_eq!(AppError::MissingSource.to_string(), "Image is not exists.");
    }

    #[test]
    fn test_invalid_parameter_names_field() {
        let err = AppError::invalid_parameter("size", "expected WxH");
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
        assert!(err.client_message().contains("'size'"));
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_worker_failures_have_production_message() {
        let err = AppError::WorkerCrashed("thread panicked at src/lib.rs".into());
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Image worker failed unexpectedly");
        assert!(err.to_string().contains("src/lib.rs"));
    }

    #[test]
    fn test_from_anyhow_is_internal() {
        let err: AppError = anyhow::anyhow!("listener closed").into();
        assert!(matches!(err, AppError::Internal(ref m) if m == "listener closed"));
        assert_eq!(err.http_status_code(), 500);
    }
}
