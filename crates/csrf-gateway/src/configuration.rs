use std::net::SocketAddr;
use std::path::Path;

use csrf_token::{CookieConfig, DEFAULT_COOKIE_NAME, DEFAULT_HEADER_NAME, DEFAULT_MAX_AGE_SECS};
use http::HeaderName;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    pub upstream: Upstream,
    /// Emits `Secure` on the binding cookie.
    #[serde(default)]
    pub production: bool,
    #[serde(default)]
    pub csrf: CsrfSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Upstream {
    /// `ip:port` of the protected application.
    pub address: String,
    #[serde(default)]
    pub tls: bool,
    #[serde(default)]
    pub sni: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CsrfSettings {
    pub cookie_name: String,
    pub header_name: String,
    pub max_age_secs: u32,
    pub issue_path: String,
    pub validate_path: String,
    /// Paths that never require a token. Matches exactly or as a `/`-bounded prefix.
    pub public_paths: Vec<String>,
    /// Successful requests to these paths also drop the binding cookie.
    pub logout_paths: Vec<String>,
}

impl Default for CsrfSettings {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            header_name: DEFAULT_HEADER_NAME.to_string(),
            max_age_secs: DEFAULT_MAX_AGE_SECS,
            issue_path: "/api/csrf-token".to_string(),
            validate_path: "/api/csrf/validate".to_string(),
            public_paths: Vec::new(),
            logout_paths: Vec::new(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

impl GatewayConfig {
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        let config: GatewayConfig = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.address.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "upstream.address '{}' is not an ip:port pair",
                self.upstream.address
            )));
        }

        let csrf = &self.csrf;
        if csrf.cookie_name.is_empty()
            || !csrf
                .cookie_name
                .bytes()
                .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b))
        {
            return Err(ConfigError::Invalid(format!(
                "cookie_name '{}' is not a valid cookie name",
                csrf.cookie_name
            )));
        }

        HeaderName::from_bytes(csrf.header_name.as_bytes()).map_err(|_| {
            ConfigError::Invalid(format!(
                "header_name '{}' is not a valid header name",
                csrf.header_name
            ))
        })?;

        if csrf.max_age_secs == 0 {
            return Err(ConfigError::Invalid("max_age_secs must be positive".into()));
        }

        let paths = [&csrf.issue_path, &csrf.validate_path]
            .into_iter()
            .chain(&csrf.public_paths)
            .chain(&csrf.logout_paths);
        for path in paths {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "path '{path}' must start with '/'"
                )));
            }
        }

        if csrf.issue_path == csrf.validate_path {
            return Err(ConfigError::Invalid(
                "issue_path and validate_path must differ".into(),
            ));
        }

        Ok(())
    }

    pub fn cookie_config(&self) -> CookieConfig {
        CookieConfig::new(self.csrf.cookie_name.clone())
            .with_secure(self.production)
            .with_max_age(self.csrf.max_age_secs)
    }
}
