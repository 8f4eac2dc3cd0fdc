use reqwest::StatusCode;
use thiserror::Error;

/// Why a request to the enquiry backend did not produce a usable answer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network failure, timeout or a body that is not the expected JSON
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned HTTP {0}")]
    Http(StatusCode),

    /// The backend answered but reported a non-success status
    #[error("server reported failure: {}", .0.as_deref().unwrap_or("no message"))]
    Rejected(Option<String>),

    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// The message the backend attached to a reported failure, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected(message) => message.as_deref(),
            _ => None,
        }
    }

    /// True when the backend itself reported the failure, false for transport problems
    pub fn is_reported(&self) -> bool {
        matches!(self, ApiError::Rejected(_))
    }
}
