//! Crawler module for catalog traversal and product extraction
//!
//! This module contains the core crawling logic, including:
//! - Parsing product-type pages and product detail pages
//! - The shared queue of product-type leaves
//! - Per-leaf worker processing
//! - Overall crawl orchestration

mod coordinator;
mod parser;
mod scheduler;
mod worker;

pub use coordinator::Orchestrator;
pub use parser::{parse_detail, parse_listing};
pub use scheduler::LeafQueue;
pub use worker::CrawlSettings;

use crate::config::Config;
use crate::output::{CrawlReport, RowSink};
use crate::session::HttpSessionFactory;
use crate::taxonomy::ProductTypeLeaf;
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Create the output file and write its header
/// 2. Fetch the seed page and discover every product type
/// 3. Crawl the product types on the configured number of workers
/// 4. Release the fetch session and report
///
/// # Errors
///
/// Returns an error if the output file cannot be created, the seed is
/// unusable, the fetch backend is unavailable, or output cannot be written.
pub async fn run_crawl(config: Config) -> Result<CrawlReport> {
    let seed = Url::parse(&config.crawler.seed_url)?;
    let sink = RowSink::create(
        Path::new(&config.output.csv_path),
        config.output.delimiter_byte(),
    )?;

    let factory = Arc::new(HttpSessionFactory::new(config.session.clone()));
    let orchestrator = Orchestrator::from_config(&config, factory, Arc::new(sink))?;

    tracing::info!(
        "Crawling {} with {} workers into {}",
        seed,
        config.crawler.workers,
        config.output.csv_path
    );

    orchestrator.crawl(&seed).await
}

/// Fetches the seed page and returns the product types it lists
///
/// Used by dry runs; nothing is written and the session is released before
/// returning.
pub async fn discover_leaves(config: &Config) -> Result<Vec<ProductTypeLeaf>> {
    let seed = Url::parse(&config.crawler.seed_url)?;
    let factory = Arc::new(HttpSessionFactory::new(config.session.clone()));
    let sink = RowSink::new(Box::new(std::io::sink()), config.output.delimiter_byte());
    let orchestrator = Orchestrator::from_config(config, factory, Arc::new(sink))?;

    let discovered = orchestrator.discover(&seed).await;
    orchestrator.pool().release_all().await;

    let leaves = discovered?;
    let summary = leaves.summary();
    tracing::info!(
        "Discovered {} product types across {} categories ({} categories skipped)",
        summary.leaves,
        summary.categories,
        summary.categories_skipped
    );

    Ok(leaves.collect())
}
