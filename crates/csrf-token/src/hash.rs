//! SHA-256 digests of token secrets.

use std::fmt;

use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Hex-encoded SHA-256 of a secret, as stored in the binding cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenDigest(String);

impl TokenDigest {
    /// Wrap a digest read back from a cookie. No format checks; mismatches fail comparison.
    pub fn from_cookie_value(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TokenDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenDigest(..)")
    }
}

/// Compute the digest for a token.
///
/// Hashes the bytes of the hex string itself, so a header value can be hashed
/// exactly as received without decoding it first.
pub fn hash(token: impl AsRef<str>) -> TokenDigest {
    let result = Sha256::digest(token.as_ref().as_bytes());
    TokenDigest(hex::encode(result))
}
