//! Configuration for the binding cookie.

use crate::{DEFAULT_COOKIE_NAME, DEFAULT_MAX_AGE_SECS};

/// Attributes of the cookie that carries the token digest.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    /// Cookie name (e.g., "csrf_token").
    pub name: String,
    /// Emit the `Secure` attribute. Enabled in production deployments.
    pub secure: bool,
    /// `Max-Age` in seconds. The server keeps no other record, so this is the token lifetime.
    pub max_age_secs: u32,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            secure: false,
            max_age_secs: DEFAULT_MAX_AGE_SECS,
        }
    }
}

impl CookieConfig {
    /// Create a new config with the given cookie name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the `Secure` flag.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set the cookie lifetime.
    pub fn with_max_age(mut self, max_age_secs: u32) -> Self {
        self.max_age_secs = max_age_secs;
        self
    }
}
