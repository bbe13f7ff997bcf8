use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway kept refusing the request after every allowed refresh.
    #[error("request rejected with {status}: {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("malformed issuance response: {0}")]
    MalformedIssuance(String),

    #[error("issued token cannot be sent as a header: {0}")]
    InvalidHeader(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
