//! Token verification with constant-time comparison.

use subtle::ConstantTimeEq;

use crate::error::{CsrfError, Result};
use crate::hash::{TokenDigest, hash};

/// Outcome of checking a submitted token against the bound digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Header digest matches the cookie digest
    Valid,
    /// Header or cookie absent
    MissingToken,
    /// Both present, digests differ
    InvalidToken,
}

impl Verdict {
    pub fn is_valid(self) -> bool {
        matches!(self, Verdict::Valid)
    }

    /// Lift the verdict into the crate's error type.
    pub fn into_result(self) -> Result<()> {
        match self {
            Verdict::Valid => Ok(()),
            Verdict::MissingToken => Err(CsrfError::MissingToken),
            Verdict::InvalidToken => Err(CsrfError::InvalidToken),
        }
    }
}

/// Verify a submitted token against the digest read from the binding cookie.
///
/// This function:
/// 1. Treats an absent or empty header, or an absent cookie, as [`Verdict::MissingToken`]
/// 2. Hashes the submitted value exactly as received
/// 3. Compares the computed digest against the stored one in constant time
pub fn verify(request_token: Option<&str>, stored: Option<&TokenDigest>) -> Verdict {
    let Some(request_token) = request_token.filter(|t| !t.is_empty()) else {
        return Verdict::MissingToken;
    };
    let Some(stored) = stored else {
        return Verdict::MissingToken;
    };

    let computed = hash(request_token);
    if constant_time_eq(computed.as_str(), stored.as_str()) {
        Verdict::Valid
    } else {
        Verdict::InvalidToken
    }
}

/// Constant-time comparison of two digests.
///
/// Returns early only on a length mismatch; digest length is fixed and public.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}
