//! Secret generation.

use std::fmt;

use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{CsrfError, Result};

/// Number of random bytes in a secret.
pub const SECRET_LEN: usize = 32;

/// The plaintext token given to the page.
///
/// Only ever exists in transit and in client memory. The server keeps its digest.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretToken(String);

impl SecretToken {
    /// The token as lowercase hex.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SecretToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Keep secrets out of logs and panic messages.
impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretToken(..)")
    }
}

/// Generate a new secret token.
///
/// Draws [`SECRET_LEN`] bytes straight from the operating system and encodes them as
/// lowercase hex. Errors out if the OS source is unavailable; there is no fallback.
pub fn generate_secret() -> Result<SecretToken> {
    let mut bytes = Zeroizing::new([0u8; SECRET_LEN]);
    OsRng
        .try_fill_bytes(&mut *bytes)
        .map_err(|e| CsrfError::Randomness(e.to_string()))?;

    Ok(SecretToken(hex::encode(&*bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_format() {
        let secret = generate_secret().unwrap();
        assert_eq!(secret.as_str().len(), SECRET_LEN * 2);
        assert!(
            secret
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn test_secrets_unique() {
        let secret1 = generate_secret().unwrap();
        let secret2 = generate_secret().unwrap();
        assert_ne!(secret1, secret2);
    }

    #[test]
    fn test_debug_redacts_value() {
        let secret = generate_secret().unwrap();
        let printed = format!("{secret:?}");
        assert!(!printed.contains(secret.as_str()));
    }
}
