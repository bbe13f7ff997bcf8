//! Route classification and token enforcement.
//!
//! Everything here is a pure function of the request line, the request headers and
//! static configuration, so the gateway and the diagnostic endpoint share one check.

use csrf_token::{TokenStore, Verdict, verify};
use http::{HeaderMap, HeaderName, HeaderValue, Method};

use crate::configuration::GatewayConfig;

/// Whether a request must carry a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Safe method, or an allow-listed path
    Exempt,
    /// Everything else
    Protected,
}

/// Requests the gateway answers itself instead of forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Issue,
    Validate,
}

/// Result of running a request through the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Exempt,
    Verified,
    MissingToken,
    InvalidToken,
}

impl Admission {
    pub fn is_allowed(self) -> bool {
        matches!(self, Admission::Exempt | Admission::Verified)
    }
}

pub struct Guard {
    store: TokenStore,
    header_name: HeaderName,
    issue_path: String,
    validate_path: String,
    public_paths: Vec<String>,
    logout_paths: Vec<String>,
}

impl Guard {
    /// Build a guard from a validated config.
    pub fn new(config: &GatewayConfig) -> Result<Self, http::header::InvalidHeaderName> {
        let csrf = &config.csrf;
        Ok(Self {
            store: TokenStore::new(config.cookie_config()),
            header_name: HeaderName::from_bytes(csrf.header_name.as_bytes())?,
            issue_path: csrf.issue_path.clone(),
            validate_path: csrf.validate_path.clone(),
            public_paths: csrf.public_paths.clone(),
            logout_paths: csrf.logout_paths.clone(),
        })
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }

    pub fn endpoint(&self, path: &str) -> Option<Endpoint> {
        if path == self.issue_path {
            Some(Endpoint::Issue)
        } else if path == self.validate_path {
            Some(Endpoint::Validate)
        } else {
            None
        }
    }

    pub fn classify(&self, method: &Method, path: &str) -> RouteClass {
        // Anything not known to be safe counts as state-changing.
        if method.is_safe() {
            return RouteClass::Exempt;
        }

        if self.endpoint(path).is_some()
            || self.public_paths.iter().any(|p| path_matches(p, path))
        {
            return RouteClass::Exempt;
        }

        RouteClass::Protected
    }

    /// Check the token header against the cookie binding.
    pub fn verify(&self, headers: &HeaderMap) -> Verdict {
        let stored = self.store.read(headers);
        let submitted = match headers.get(&self.header_name).map(HeaderValue::to_str) {
            None => None,
            Some(Ok(value)) => Some(value),
            // Not visible ASCII, so it cannot be a hex token.
            Some(Err(_)) if stored.is_some() => return Verdict::InvalidToken,
            Some(Err(_)) => return Verdict::MissingToken,
        };

        verify(submitted, stored.as_ref())
    }

    pub fn admit(&self, method: &Method, path: &str, headers: &HeaderMap) -> Admission {
        match self.classify(method, path) {
            RouteClass::Exempt => Admission::Exempt,
            RouteClass::Protected => match self.verify(headers) {
                Verdict::Valid => Admission::Verified,
                Verdict::MissingToken => Admission::MissingToken,
                Verdict::InvalidToken => Admission::InvalidToken,
            },
        }
    }

    pub fn is_logout(&self, path: &str) -> bool {
        self.logout_paths.iter().any(|p| path_matches(p, path))
    }
}

/// `pattern` matches itself and anything below it on a `/` boundary.
///
/// Paths with dot segments never match: an upstream that normalizes them could
/// resolve `/public/../private` outside the matched prefix.
fn path_matches(pattern: &str, path: &str) -> bool {
    if has_dot_segment(path) {
        return false;
    }
    match path.strip_prefix(pattern) {
        Some(rest) => rest.is_empty() || pattern.ends_with('/') || rest.starts_with('/'),
        None => false,
    }
}

/// `.` or `..` as a whole segment, literal or percent-encoded.
fn has_dot_segment(path: &str) -> bool {
    path.split('/').any(|segment| {
        let segment = segment.to_ascii_lowercase().replace("%2e", ".");
        segment == "." || segment == ".."
    })
}
