//! Cookie binding for token digests.
//!
//! The digest lives only in the client's cookie jar. Issuing overwrites the previous
//! binding, clearing removes it, and an expired cookie is simply never sent back.

use cookie::time::Duration;
use cookie::{Cookie, SameSite};
use http::{HeaderMap, HeaderValue, header};

use crate::config::CookieConfig;
use crate::hash::TokenDigest;

/// A `Set-Cookie` instruction for the response.
#[derive(Debug, Clone)]
pub struct CookieDirective {
    cookie: Cookie<'static>,
}

impl CookieDirective {
    /// The directive rendered as a `Set-Cookie` header value.
    pub fn header_value(&self) -> String {
        self.cookie.to_string()
    }

    /// Same as [`header_value`](Self::header_value), ready to insert into a header map.
    pub fn to_header(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.header_value()).ok()
    }

    pub fn cookie(&self) -> &Cookie<'static> {
        &self.cookie
    }
}

/// Issues, reads and clears the digest cookie.
#[derive(Debug, Clone)]
pub struct TokenStore {
    config: CookieConfig,
}

impl TokenStore {
    pub fn new(config: CookieConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CookieConfig {
        &self.config
    }

    /// Bind `digest` to the client, replacing any previous binding.
    pub fn issue(&self, digest: &TokenDigest) -> CookieDirective {
        let cookie = self
            .base(digest.as_str().to_string())
            .max_age(Duration::seconds(i64::from(self.config.max_age_secs)))
            .build();

        CookieDirective { cookie }
    }

    /// Remove the binding (logout, or a refresh from scratch).
    pub fn clear(&self) -> CookieDirective {
        let mut cookie = self.base(String::new()).build();
        cookie.make_removal();

        CookieDirective { cookie }
    }

    /// Read the bound digest from the request's `Cookie` headers.
    pub fn read(&self, headers: &HeaderMap) -> Option<TokenDigest> {
        let cookies = headers
            .get_all(header::COOKIE)
            .into_iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse);

        for cookie in cookies {
            let cookie = match cookie {
                Ok(cookie) => cookie,
                Err(error) => {
                    log::debug!("failed to parse cookie: {error}");
                    continue;
                }
            };

            if cookie.name() == self.config.name {
                let value = cookie.value_trimmed();
                if value.is_empty() {
                    return None;
                }
                return Some(TokenDigest::from_cookie_value(value));
            }
        }

        None
    }

    fn base(&self, value: String) -> cookie::CookieBuilder<'static> {
        Cookie::build((self.config.name.clone(), value))
            .http_only(true)
            .secure(self.config.secure)
            .same_site(SameSite::Lax)
            .path("/")
    }
}
