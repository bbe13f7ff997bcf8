//! Anti-forgery token primitives and cookie binding.
//!
//! This crate provides functionality for:
//! - Minting 256-bit secrets from the operating system's CSPRNG
//! - Hashing secrets into the digest that is bound to the client cookie
//! - Verifying a submitted token against the bound digest using constant-time comparison
//! - Building and reading the `Set-Cookie` / `Cookie` binding
//!
//! # Token Format
//!
//! The secret handed to the page is 32 random bytes as 64 lowercase hex characters.
//! The cookie carries `hex(sha256(secret))`, never the secret itself.
//!
//! # Security Features
//!
//! - SHA-256 digest in an `HttpOnly` cookie, unreadable from script
//! - Constant-time comparison to prevent timing attacks
//! - Memory zeroization of secrets after use
//! - Minting fails instead of degrading when the OS random source is unavailable
//!
//! # Example
//!
//! ```rust
//! use csrf_token::{CookieConfig, TokenStore, Verdict, generate_secret, hash, verify};
//!
//! let store = TokenStore::new(CookieConfig::default());
//!
//! // Mint a token and bind its digest to the client
//! let secret = generate_secret().unwrap();
//! let directive = store.issue(&hash(&secret));
//! println!("Set-Cookie: {}", directive.header_value());
//!
//! // Later, the header value is checked against the cookie digest
//! let stored = hash(&secret);
//! assert_eq!(verify(Some(secret.as_str()), Some(&stored)), Verdict::Valid);
//! ```

mod config;
mod error;
mod hash;
mod secret;
mod store;
mod verify;

// Public re-exports
pub use config::CookieConfig;
pub use error::{CsrfError, Result};
pub use hash::{DIGEST_HEX_LEN, TokenDigest, hash};
pub use secret::{SECRET_LEN, SecretToken, generate_secret};
pub use store::{CookieDirective, TokenStore};
pub use verify::{Verdict, constant_time_eq, verify};

/// Header the page echoes the plaintext token in.
pub const DEFAULT_HEADER_NAME: &str = "x-csrf-token";

/// Name of the cookie holding the digest.
pub const DEFAULT_COOKIE_NAME: &str = "csrf_token";

/// Cookie lifetime: 24 hours.
pub const DEFAULT_MAX_AGE_SECS: u32 = 86_400;
