//! Per-leaf processing
//!
//! A worker pops leaves off the shared queue until it is drained or closed.
//! Recoverable failures stay inside the leaf: they are logged with the leaf's
//! identity, counted, and the leaf contributes no rows. Only fatal errors
//! (backend unavailable, sink failure) leave the worker, after closing the
//! queue.

use crate::crawler::parser::{parse_detail, parse_listing};
use crate::crawler::scheduler::LeafQueue;
use crate::extract::SelectorSet;
use crate::output::{OutputRow, ProductDetail, ProductSummary, RowSink, RunCounters};
use crate::session::PageFetcher;
use crate::taxonomy::ProductTypeLeaf;
use crate::{CatalogError, Result};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Knobs that shape how each leaf is processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSettings {
    pub workers: usize,
    pub page_timeout: Duration,
    pub request_delay: Duration,
    pub fetch_details: bool,
}

/// Everything a worker needs, shared by all workers of a run
pub(crate) struct WorkerContext {
    pub queue: LeafQueue,
    pub fetcher: Arc<PageFetcher>,
    pub selectors: Arc<SelectorSet>,
    pub sink: Arc<RowSink>,
    pub counters: RunCounters,
    pub settings: CrawlSettings,
}

/// Drains the queue; returns only a fatal error
pub(crate) async fn worker_loop(id: usize, ctx: Arc<WorkerContext>) -> Result<()> {
    tracing::debug!("Worker {} started", id);

    while let Some(leaf) = ctx.queue.next_leaf() {
        tracing::info!("[worker {}] Crawling {} ({})", id, leaf, leaf.link);

        let in_flight = InFlight {
            ctx: &ctx,
            id,
            leaf: &leaf,
            finished: false,
        };
        let outcome = process_leaf(&ctx, &leaf).await;
        in_flight.finish();

        match outcome {
            Ok(products) => {
                ctx.counters.leaf_succeeded(products);
                tracing::info!(
                    "[worker {}] {}: {} products ({} of {} product types done)",
                    id,
                    leaf,
                    products,
                    ctx.counters.leaves_done(),
                    ctx.queue.total()
                );
            }
            Err(e) if !e.is_fatal() => {
                ctx.counters.leaf_failed(&failure_label(&e));
                tracing::warn!("[worker {}] Skipping {} ({}): {}", id, leaf, leaf.link, e);
            }
            Err(e) => {
                ctx.counters.leaf_failed(&failure_label(&e));
                ctx.queue.close();
                tracing::error!("[worker {}] Fatal error on {}: {}", id, leaf, e);
                return Err(e);
            }
        }

        if !ctx.settings.request_delay.is_zero() {
            tokio::time::sleep(ctx.settings.request_delay).await;
        }
    }

    tracing::debug!("Worker {} finished", id);
    Ok(())
}

/// Marks a leaf as being processed by a worker
///
/// If the worker task dies mid-leaf (a panic), the guard is dropped without
/// `finish` and counts the leaf as failed, naming it in the log.
struct InFlight<'a> {
    ctx: &'a WorkerContext,
    id: usize,
    leaf: &'a ProductTypeLeaf,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.ctx.counters.leaf_failed(PANIC_LABEL);
            tracing::error!(
                "[worker {}] Panicked while crawling {} ({})",
                self.id,
                self.leaf,
                self.leaf.link
            );
        }
    }
}

/// Failure label for leaves lost to a panicking worker
pub(crate) const PANIC_LABEL: &str = "worker panic";

/// Fetches one product-type page and appends a row per product card
///
/// Rows are appended only after every card has been resolved, so a leaf
/// either contributes all of its rows or none.
pub(crate) async fn process_leaf(ctx: &WorkerContext, leaf: &ProductTypeLeaf) -> Result<u64> {
    let page = ctx
        .fetcher
        .fetch(
            &leaf.link,
            &ctx.selectors.listing.marker,
            ctx.settings.page_timeout,
        )
        .await?;

    let summaries = parse_listing(&page, &ctx.selectors.listing);
    if summaries.is_empty() {
        tracing::info!("No product cards found for {}", leaf);
    }

    let mut rows = Vec::with_capacity(summaries.len());
    for summary in &summaries {
        let detail = match &summary.detail_link {
            Some(link) if ctx.settings.fetch_details => {
                fetch_detail(ctx, leaf, summary, link).await?
            }
            _ => ProductDetail::default(),
        };
        rows.push(OutputRow::from_parts(leaf, summary, &detail));
    }

    for row in &rows {
        ctx.sink.append_row(row)?;
    }

    Ok(rows.len() as u64)
}

/// Fetches a detail page; a recoverable failure degrades to empty fields
async fn fetch_detail(
    ctx: &WorkerContext,
    leaf: &ProductTypeLeaf,
    summary: &ProductSummary,
    link: &Url,
) -> Result<ProductDetail> {
    match ctx
        .fetcher
        .fetch(link, &ctx.selectors.detail.marker, ctx.settings.page_timeout)
        .await
    {
        Ok(page) => {
            ctx.counters.detail_fetched();
            tracing::debug!("Fetched detail for '{}' ({})", summary.name, link);
            Ok(parse_detail(&page, &ctx.selectors.detail))
        }
        Err(CatalogError::Fetch(e)) => {
            ctx.counters.detail_failed(e.kind);
            tracing::warn!(
                "Detail page for '{}' under {} failed, leaving detail columns empty: {}",
                summary.name,
                leaf,
                e
            );
            Ok(ProductDetail::default())
        }
        Err(e) => Err(e),
    }
}

/// Short label used to group failures in the run report
pub(crate) fn failure_label(error: &CatalogError) -> String {
    match error {
        CatalogError::Fetch(e) => e.kind.to_string(),
        CatalogError::BackendUnavailable { .. } => "backend unavailable".to_string(),
        CatalogError::Sink(_) => "output error".to_string(),
        other => other.to_string(),
    }
}
