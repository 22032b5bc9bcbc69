use thiserror::Error;

/// Failure of a single call to the certificate API.
///
/// None of these are retried: the user re-issues the command.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure: timeout, DNS, refused connection, TLS
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("HTTP request failed with status: {status}")]
    Status { status: reqwest::StatusCode, body: String },

    /// Envelope with `success: false`; the message is the server's own text
    #[error("{0}")]
    Remote(String),

    /// Body could not be decoded as the expected JSON
    #[error("Bad response: {0}")]
    Decode(String),

    /// Request could not be built (bad base URL)
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

/// Result type of [`super::CertificateApi`] calls
pub type ApiResult<T> = Result<T, ApiError>;
