//! Fetch sessions and the pool that owns them
//!
//! This module contains everything between a URL and a realized document:
//! - The [`Session`] / [`SessionFactory`] seam to the fetch backend
//! - The HTTP backend shipped with the crate
//! - The [`ResourcePool`] holding the single shared session of a run
//! - The [`PageFetcher`], which adds readiness checks and retries

mod fetcher;
mod http;
mod pool;

pub use fetcher::{PageFetcher, RetryPolicy};
pub use http::{build_http_client, HttpSession, HttpSessionFactory};
pub use pool::{ResourcePool, SessionHandle};

use async_trait::async_trait;
use scraper::Html;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Why a single fetch did not produce a usable document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The attempt exceeded its time budget
    Timeout,
    /// Connection, TLS, or body read failure
    Network,
    /// The server answered with a non-success status
    Status(u16),
    /// The page loaded but the readiness marker never appeared
    MissingMarker,
}

impl FailureKind {
    /// Returns true if another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Network => true,
            Self::Status(code) => *code >= 500,
            Self::MissingMarker => false,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Network => write!(f, "network error"),
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::MissingMarker => write!(f, "readiness marker missing"),
        }
    }
}

/// A recoverable failure of one fetch
#[derive(Debug, Clone, Error)]
#[error("{kind} for {url}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub url: String,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Realized markup of a fetched page
///
/// The markup is kept as text so documents can move between tasks; it is
/// parsed on demand inside synchronous extraction code.
#[derive(Debug, Clone)]
pub struct Document {
    url: Url,
    markup: String,
}

impl Document {
    pub fn new(url: Url, markup: impl Into<String>) -> Self {
        Self {
            url,
            markup: markup.into(),
        }
    }

    /// The URL the document was requested from; base for relative links
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn parse(&self) -> Html {
        Html::parse_document(&self.markup)
    }
}

/// A stateful handle able to navigate to URLs and return realized markup
///
/// Implementations are not expected to support concurrent navigation; the
/// pool serializes access.
#[async_trait]
pub trait Session: Send {
    /// Navigates to `url` and returns the page markup
    async fn navigate(&mut self, url: &Url) -> Result<String, FetchError>;

    /// Tears the session down; called exactly once by the pool
    async fn close(&mut self);
}

/// Constructs sessions for the pool
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Builds a new session
    ///
    /// # Errors
    ///
    /// Any error is reported by the pool as `CatalogError::BackendUnavailable`.
    async fn create(&self) -> crate::Result<Box<dyn Session>>;
}
