use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// The transport could not reach the prediction server.
    NetworkError(String),
    /// The prediction server answered with a non-success status.
    HttpStatus {
        /// Numeric HTTP status code.
        status: u16,
        /// Response body, if it could be read.
        body: String,
    },
    /// The response body was not JSON or did not have the expected shape.
    MalformedResponse(String),
    /// A required form field was missing or could not be parsed.
    InvalidForm(String),
    /// A submission is already in flight for this form.
    Conflict(String),
    /// Resource not found error.
    NotFound(String),
    /// Internal error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Returns the HTTP status carried by an `HttpStatus` error, looking
    /// through any context wrappers.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AppError::HttpStatus { status, .. } => Some(*status),
            AppError::WithContext { source, .. } => source.status_code(),
            _ => None,
        }
    }

    /// Strips context wrappers and returns the innermost error.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            AppError::HttpStatus { status, .. } => write!(f, "HTTP error! status: {}", status),
            AppError::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
            AppError::InvalidForm(msg) => write!(f, "Invalid form: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Upstream failures surface as gateway errors; local input problems as
    /// client errors.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NetworkError(msg) => {
                tracing::error!("Prediction server unreachable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Prediction service unavailable".to_string(),
                )
            }
            AppError::HttpStatus { status, body } => {
                tracing::error!("Prediction server returned {}: {}", status, body);
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Prediction service returned status {}", status),
                )
            }
            AppError::MalformedResponse(msg) => {
                tracing::error!("Malformed prediction response: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Malformed prediction response".to_string(),
                )
            }
            AppError::InvalidForm(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
                return (**source).clone().into_response();
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    ///
    /// Status errors keep their code; decode failures are malformed bodies;
    /// everything else is a transport failure.
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            AppError::HttpStatus {
                status: status.as_u16(),
                body: String::new(),
            }
        } else if err.is_decode() {
            AppError::MalformedResponse(err.to_string())
        } else {
            AppError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    ///
    /// # Arguments
    ///
    /// * `f` - A closure that produces the context message.
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for serde_json::Error so shape failures read as malformed bodies.
impl<T> ResultExt<T> for Result<T, serde_json::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::MalformedResponse(e.to_string())),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::MalformedResponse(e.to_string())),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_seen_through_context() {
        let err: Result<(), AppError> = Err(AppError::HttpStatus {
            status: 403,
            body: "CSRF verification failed".to_string(),
        });
        let wrapped = err.context("POST /api/predict/").unwrap_err();

        assert_eq!(wrapped.status_code(), Some(403));
        assert!(matches!(wrapped.root(), AppError::HttpStatus { .. }));
        assert_eq!(
            wrapped.to_string(),
            "POST /api/predict/: HTTP error! status: 403"
        );
    }

    #[test]
    fn test_into_response_status_mapping() {
        let cases = vec![
            (AppError::NetworkError("refused".into()), StatusCode::SERVICE_UNAVAILABLE),
            (
                AppError::HttpStatus {
                    status: 500,
                    body: String::new(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (AppError::MalformedResponse("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::InvalidForm("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_json_error_becomes_malformed() {
        let parsed: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err = parsed.context("parsing prediction").unwrap_err();
        assert!(matches!(err.root(), AppError::MalformedResponse(_)));
    }
}
