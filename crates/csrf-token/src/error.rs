//! Error types for token operations.

use thiserror::Error;

/// Errors that can occur while minting or checking tokens.
#[derive(Debug, Error)]
pub enum CsrfError {
    /// No token header on a protected mutating request, or no binding cookie
    #[error("Missing token")]
    MissingToken,

    /// Token present but its digest does not match the bound cookie
    #[error("Invalid token")]
    InvalidToken,

    /// The operating system random source failed
    #[error("Secure random source unavailable: {0}")]
    Randomness(String),

    /// Token could not be issued (randomness or cookie write failure)
    #[error("Token issuance failed: {0}")]
    Issuance(String),
}

/// Result type alias for token operations.
pub type Result<T> = std::result::Result<T, CsrfError>;
