//! HTTP session backend
//!
//! This module provides the session implementation used by the binary:
//! - Building an HTTP client with the configured user agent
//! - A cookie store, so the session carries state between navigations
//! - Classifying transport and status failures into [`FailureKind`]s

use crate::config::SessionConfig;
use crate::session::{FailureKind, FetchError, Session, SessionFactory};
use crate::CatalogError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// The client has no overall request timeout; each navigation is bounded by
/// the page fetcher instead.
///
/// # Example
///
/// ```no_run
/// use catalog_ripple::config::SessionConfig;
/// use catalog_ripple::session::build_http_client;
///
/// let client = build_http_client(&SessionConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &SessionConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(10))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Session backed by a cookie-carrying HTTP client
pub struct HttpSession {
    client: Client,
}

impl HttpSession {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn navigate(&mut self, url: &Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::Status(status.as_u16()),
                url.as_str(),
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            ));
        }

        response.text().await.map_err(|e| classify_error(url, &e))
    }

    async fn close(&mut self) {
        tracing::debug!("Closing HTTP session");
    }
}

/// Maps a transport error onto a failure kind
fn classify_error(url: &Url, error: &reqwest::Error) -> FetchError {
    let kind = if error.is_timeout() {
        FailureKind::Timeout
    } else {
        FailureKind::Network
    };
    FetchError::new(kind, url.as_str(), error.to_string())
}

/// Factory producing [`HttpSession`]s from the session configuration
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    config: SessionConfig,
}

impl HttpSessionFactory {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn create(&self) -> crate::Result<Box<dyn Session>> {
        let client =
            build_http_client(&self.config).map_err(|e| CatalogError::BackendUnavailable {
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Box::new(HttpSession::new(client)))
    }
}
