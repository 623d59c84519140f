//! Error types for course API operations.

use thiserror::Error;

/// Errors from talking to the wizard backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure: DNS, connect, timeout, TLS.
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// The server answered 2xx but the body was not what we expected.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Local JSON encoding failed while preparing a request.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether retrying the same request later could plausibly succeed.
    ///
    /// Callers that swallow write failures use this to distinguish a
    /// flaky backend from a rejected request when logging.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Status { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            ApiError::InvalidResponse(_) | ApiError::Json(_) => false,
        }
    }

    /// HTTP status code, when the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transience() {
        let server = ApiError::Status {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(server.is_transient());
        assert_eq!(server.status(), Some(503));

        let rate_limited = ApiError::Status {
            status: 429,
            message: "slow down".into(),
        };
        assert!(rate_limited.is_transient());

        let not_found = ApiError::Status {
            status: 404,
            message: "no such course".into(),
        };
        assert!(!not_found.is_transient());

        let bad_body = ApiError::InvalidResponse("missing id".into());
        assert!(!bad_body.is_transient());
        assert_eq!(bad_body.status(), None);
    }
}
