//! Client side of the double-submit token exchange.
//!
//! [`TokenProvider`] fetches a token from the issuance endpoint once, caches it,
//! and attaches it to every state-changing request. A `403` from the gateway
//! triggers a single shared refresh followed by a bounded retry.
//!
//! ```no_run
//! use csrf_client::{ProviderConfig, TokenProvider};
//! use reqwest::Method;
//!
//! # async fn run() -> Result<(), csrf_client::ClientError> {
//! let provider = TokenProvider::new(ProviderConfig::new("https://app.example/api/csrf-token"))?;
//! let response = provider
//!     .send(Method::POST, "https://app.example/api/patients", |request| {
//!         request.body(r#"{"name":"Ada"}"#)
//!     })
//!     .await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

mod error;
mod provider;

pub use error::{ClientError, Result};
pub use provider::{IssuedToken, ProviderConfig, TokenProvider};
