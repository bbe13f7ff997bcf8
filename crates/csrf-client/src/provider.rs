use std::fmt;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{ClientError, Result};

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Absolute URL of the issuance endpoint.
    pub issue_url: String,
    /// Refresh-and-retry rounds after a `403` before giving up.
    pub max_retries: u32,
}

impl ProviderConfig {
    pub fn new(issue_url: impl Into<String>) -> Self {
        Self {
            issue_url: issue_url.into(),
            max_retries: 1,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Wire shape of the issuance response.
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
struct IssueResponse {
    token: String,
    #[serde(rename = "headerName")]
    header_name: String,
}

/// A token ready to be attached to requests.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    header_name: HeaderName,
    value: HeaderValue,
}

impl IssuedToken {
    fn from_response(response: &IssueResponse) -> Result<Self> {
        if response.token.is_empty() {
            return Err(ClientError::MalformedIssuance("empty token".into()));
        }
        if !response.token.is_ascii() {
            return Err(ClientError::InvalidHeader("token is not ASCII".into()));
        }

        let header_name = HeaderName::from_bytes(response.header_name.as_bytes())
            .map_err(|e| ClientError::InvalidHeader(format!("{}: {e}", response.header_name)))?;
        let mut value = HeaderValue::from_str(&response.token)
            .map_err(|e| ClientError::InvalidHeader(e.to_string()))?;
        value.set_sensitive(true);

        Ok(Self { header_name, value })
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }

    pub fn token(&self) -> &str {
        self.value.to_str().unwrap_or_default()
    }

    /// Add `<headerName>: <token>` to a request.
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(self.header_name.clone(), self.value.clone())
    }
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("header_name", &self.header_name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Fetches, caches and attaches the anti-forgery token.
///
/// All cache access goes through one async mutex, so concurrent first use
/// and concurrent rejections each cost a single issuance call.
pub struct TokenProvider {
    http: Client,
    config: ProviderConfig,
    cache: Mutex<Option<IssuedToken>>,
}

impl TokenProvider {
    /// A provider with its own cookie-storing client, so the binding cookie
    /// set at issuance is sent back on later requests.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http = Client::builder().cookie_store(true).build()?;
        Ok(Self::with_client(http, config))
    }

    /// Use an existing client. It must keep cookies for the exchange to work.
    pub fn with_client(http: Client, config: ProviderConfig) -> Self {
        Self {
            http,
            config,
            cache: Mutex::new(None),
        }
    }

    pub fn client(&self) -> &Client {
        &self.http
    }

    /// The cached token, fetched on first use.
    pub async fn token(&self) -> Result<IssuedToken> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.as_ref() {
            return Ok(token.clone());
        }

        let token = self.fetch().await?;
        *cache = Some(token.clone());
        Ok(token)
    }

    /// Force a new issuance and replace the cache.
    pub async fn refresh(&self) -> Result<IssuedToken> {
        let mut cache = self.cache.lock().await;
        let token = self.fetch().await?;
        *cache = Some(token.clone());
        Ok(token)
    }

    /// Re-issue only if `stale` is still cached; otherwise another caller already did.
    async fn refresh_stale(&self, stale: &IssuedToken) -> Result<IssuedToken> {
        let mut cache = self.cache.lock().await;
        if let Some(current) = cache.as_ref() {
            if current != stale {
                return Ok(current.clone());
            }
        }

        let token = self.fetch().await?;
        *cache = Some(token.clone());
        Ok(token)
    }

    /// Forget the cached token, e.g. on login or logout.
    pub async fn clear(&self) {
        self.cache.lock().await.take();
    }

    /// Attach the current token to a request.
    pub async fn attach(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(self.token().await?.apply(request))
    }

    /// Send a request, attaching the token for state-changing methods.
    ///
    /// `build` is invoked once per attempt to set the body and extra headers.
    /// A `403` on a tokened request refreshes the token and retries up to
    /// `max_retries` times before returning [`ClientError::Rejected`].
    pub async fn send<F>(&self, method: Method, url: &str, build: F) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let mut token = if method.is_safe() {
            None
        } else {
            Some(self.token().await?)
        };
        let mut attempt = 0;

        loop {
            let mut request = build(self.http.request(method.clone(), url));
            if let Some(token) = &token {
                request = token.apply(request);
            }

            let response = request.send().await?;
            if response.status() != StatusCode::FORBIDDEN {
                return Ok(response);
            }
            let Some(stale) = token.take() else {
                return Ok(response);
            };

            if attempt >= self.config.max_retries {
                return Err(Self::rejected(response).await);
            }
            attempt += 1;
            log::debug!("{method} {url} rejected, refreshing token (attempt {attempt})");
            token = Some(self.refresh_stale(&stale).await?);
        }
    }

    async fn fetch(&self) -> Result<IssuedToken> {
        let response = self
            .http
            .get(&self.config.issue_url)
            .send()
            .await?
            .error_for_status()?;
        let body = response.bytes().await?;
        let issued: IssueResponse = serde_json::from_slice(&body)
            .map_err(|e| ClientError::MalformedIssuance(e.to_string()))?;

        let token = IssuedToken::from_response(&issued)?;
        log::debug!("fetched csrf token from {}", self.config.issue_url);
        Ok(token)
    }

    async fn rejected(response: Response) -> ClientError {
        let status = response.status();
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("message")?.as_str().map(str::to_owned))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_owned());
        ClientError::Rejected { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(token: &str, header_name: &str) -> IssueResponse {
        IssueResponse {
            token: token.to_string(),
            header_name: header_name.to_string(),
        }
    }

    #[test]
    fn issued_token_from_valid_response() {
        let token = IssuedToken::from_response(&response("abc123", "x-csrf-token")).unwrap();
        assert_eq!(token.header_name().as_str(), "x-csrf-token");
        assert_eq!(token.token(), "abc123");
        assert!(!format!("{token:?}").contains("abc123"));
    }

    #[test]
    fn rejects_empty_token() {
        let result = IssuedToken::from_response(&response("", "x-csrf-token"));
        assert!(matches!(result, Err(ClientError::MalformedIssuance(_))));
    }

    #[test]
    fn rejects_unusable_header() {
        let result = IssuedToken::from_response(&response("abc", "x csrf"));
        assert!(matches!(result, Err(ClientError::InvalidHeader(_))));

        let result = IssuedToken::from_response(&response("abc\n", "x-csrf-token"));
        assert!(matches!(result, Err(ClientError::InvalidHeader(_))));

        let result = IssuedToken::from_response(&response("jeton-é", "x-csrf-token"));
        assert!(matches!(result, Err(ClientError::InvalidHeader(_))));
    }

    #[test]
    fn default_config_retries_once() {
        let config = ProviderConfig::new("http://localhost/api/csrf-token");
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.with_max_retries(3).max_retries, 3);
    }
}
