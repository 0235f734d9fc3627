//! Catalog-Ripple: a concurrent retail catalog crawler
//!
//! This crate walks a retailer's category → subcategory → product-type
//! taxonomy from a single seed page, fans the discovered product-type pages out
//! across a bounded worker pool sharing one fetch session, and flattens every
//! product (plus its optional detail page) into a delimited output table.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod session;
pub mod taxonomy;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Ripple operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch backend unavailable: {message}")]
    BackendUnavailable { message: String },

    #[error("Seed page {url} could not be used: {source}")]
    Seed {
        url: String,
        source: session::FetchError,
    },

    #[error("Fetch error: {0}")]
    Fetch(#[from] session::FetchError),

    #[error("Output error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// Returns true for errors that must terminate the whole run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Fetch(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

/// Result type alias for Catalog-Ripple operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, Orchestrator};
pub use output::{CrawlReport, OutputRow, RowSink};
pub use session::{PageFetcher, ResourcePool, Session, SessionFactory};
pub use taxonomy::{walk, ProductTypeLeaf};
