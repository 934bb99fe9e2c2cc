use thiserror::Error;

/// Failures while building a client. Request failures are reported as
/// [`phonebook_core::ServiceError`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    #[error("api token contains characters not allowed in a header")]
    InvalidToken,
}

pub type Result<T> = std::result::Result<T, ClientError>;
