use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure before a response arrived
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The directory answered with an error envelope
    #[error("Directory returned {status}: {message}")]
    Api {
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("Failed to decode directory response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_timeout() || e.is_connect(),
            ClientError::Api { retryable, .. } => *retryable,
            ClientError::Decode(_) => false,
        }
    }

    /// HTTP status of an error envelope, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
