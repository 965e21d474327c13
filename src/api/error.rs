//! Error types for bot API requests.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to the bot's JSON API.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// The request never reached the server or the connection broke.
    #[error("Connection failed: {0}")]
    Transport(String),

    /// No response arrived within the request bound.
    #[error("Request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// The server answered with a non-2xx status.
    #[error("API returned status {status}")]
    Http { status: u16 },

    /// The body was not JSON or not the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The server accepted the request but reported a failure in the payload.
    #[error("{0}")]
    Application(String),
}

impl ApiError {
    /// Short label used in logs and toasts.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Transport(_) => "transport",
            ApiError::Timeout(_) => "timeout",
            ApiError::Http { .. } => "http",
            ApiError::Malformed(_) => "malformed",
            ApiError::Application(_) => "application",
        }
    }

    /// True for a 404, which makes the client try deprecated endpoint aliases.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Http { status: 404 })
    }
}

impl ApiError {
    /// Classify a transport-level failure. A timeout reported by the HTTP
    /// stack carries no bound, so it is described rather than given a
    /// duration.
    fn from_transport(timed_out: bool, status: Option<u16>, detail: String) -> Self {
        match status {
            _ if timed_out => ApiError::Transport(format!("request timed out ({})", detail)),
            Some(status) => ApiError::Http { status },
            None => ApiError::Transport(detail),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        ApiError::from_transport(err.is_timeout(), status, err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ApiError::Http { status: 503 }.to_string(),
            "API returned status 503"
        );
        assert_eq!(
            ApiError::Timeout(Duration::from_secs(10)).to_string(),
            "Request timed out after 10s"
        );
        assert_eq!(
            ApiError::Application("Admin permissions required".to_string()).to_string(),
            "Admin permissions required"
        );
    }

    #[test]
    fn test_not_found_detection() {
        assert!(ApiError::Http { status: 404 }.is_not_found());
        assert!(!ApiError::Http { status: 500 }.is_not_found());
        assert!(!ApiError::Transport("refused".to_string()).is_not_found());
    }

    #[test]
    fn test_http_stack_timeout_has_no_fake_duration() {
        let err = ApiError::from_transport(true, None, "operation timed out".to_string());
        assert_eq!(err.kind(), "transport");
        assert_eq!(
            err.to_string(),
            "Connection failed: request timed out (operation timed out)"
        );

        let err = ApiError::from_transport(false, Some(502), "bad gateway".to_string());
        assert_eq!(err, ApiError::Http { status: 502 });
    }

    #[test]
    fn test_malformed_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let api: ApiError = err.into();
        assert_eq!(api.kind(), "malformed");
    }
}
