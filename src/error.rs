//! Error taxonomy for the triage pipeline.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Classifier port failures. Both variants are recovered by the caller with a
/// fallback classification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    /// Network, timeout, HTTP status or missing credentials.
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    /// Response could not be mapped onto the closed schema.
    #[error("classifier returned malformed output: {0}")]
    MalformedOutput(String),
}

impl ClassifyError {
    /// Short label for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifyError::Unavailable(_) => "unavailable",
            ClassifyError::MalformedOutput(_) => "malformed",
        }
    }
}

/// A news/social source could not deliver items.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("source {source_name} request failed: {message}")]
    Fetch {
        source_name: &'static str,
        message: String,
    },

    #[error("source {source_name} timed out after {timeout_ms} ms")]
    Timeout {
        source_name: &'static str,
        timeout_ms: u64,
    },

    #[error("source {source_name} returned an unreadable payload: {message}")]
    Payload {
        source_name: &'static str,
        message: String,
    },
}

/// Persistence hand-off failure. Logged only.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors that reach the HTTP boundary.
#[derive(Error, Debug)]
pub enum TriageError {
    /// Bad caller input (400).
    #[error("validation error: {0}")]
    Validation(String),

    /// Every configured source failed.
    #[error("feed unavailable: {0}")]
    FeedUnavailable(String),

    /// Anything unexpected, e.g. a panic caught at the router.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TriageError {
    fn status(&self) -> StatusCode {
        match self {
            TriageError::Validation(_) => StatusCode::BAD_REQUEST,
            TriageError::FeedUnavailable(_) | TriageError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for TriageError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal detail stays in the log.
        let message = match &self {
            TriageError::Validation(msg) => msg.clone(),
            TriageError::FeedUnavailable(_) => "Error fetching feed".to_string(),
            TriageError::Internal(_) => "Error processing request".to_string(),
        };
        if status.is_server_error() {
            tracing::error!(target: "api", error = %self, "request failed");
        }
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            TriageError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TriageError::FeedUnavailable("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            TriageError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn classify_error_kinds() {
        assert_eq!(ClassifyError::Unavailable("t".into()).kind(), "unavailable");
        assert_eq!(ClassifyError::MalformedOutput("t".into()).kind(), "malformed");
    }
}
