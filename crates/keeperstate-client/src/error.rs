use thiserror::Error;

/// Errors from ClickHouse operations.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("server error (code {code}): {message}")]
    Server { code: u32, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("column {index}: {message}")]
    Column { index: usize, message: String },

    #[error("statement parameter error: {0}")]
    Param(String),

    #[error("client configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Check if this error is worth retrying by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Timeout(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout(e.to_string())
        } else if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
