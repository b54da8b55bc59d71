// svckit/src/errors.rs
//
// Error taxonomy shared by the client, the fixture backend and the mock server

use thiserror::Error;

/// Failure of a single API call.
///
/// `Status` displays as its bare message so callers can surface it verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Builds the error for a non-success response, preferring the server's message.
    pub fn from_status(status: u16, status_text: &str, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("request failed: {} {}", status, status_text));
        ApiError::Status { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Network failures and unreadable success bodies.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Decode(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Rejections produced by the in-memory log store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),
}

impl StoreError {
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::InvalidRequest(_) => 400,
            StoreError::NotFound(_) => 404,
        }
    }
}
