//! Crawl orchestrator - main crawl coordination logic
//!
//! This module ties the pieces of a run together:
//! - Writing the output header before anything is fetched
//! - Fetching the seed page and walking the taxonomy
//! - Spawning a fixed number of workers over the discovered leaves
//! - Releasing the shared session exactly once, on every exit path
//! - Freezing the run counters into a report

use crate::config::Config;
use crate::crawler::scheduler::LeafQueue;
use crate::crawler::worker::{worker_loop, CrawlSettings, WorkerContext};
use crate::extract::SelectorSet;
use crate::output::{CrawlReport, OutputRow, RowSink, RunCounters};
use crate::session::{PageFetcher, ResourcePool, RetryPolicy, SessionFactory};
use crate::taxonomy::{walk, Leaves, ProductTypeLeaf};
use crate::{CatalogError, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use url::Url;

impl From<&crate::config::CrawlerConfig> for CrawlSettings {
    fn from(config: &crate::config::CrawlerConfig) -> Self {
        Self {
            workers: config.workers,
            page_timeout: Duration::from_secs(config.page_timeout_secs),
            request_delay: Duration::from_millis(config.request_delay_ms),
            fetch_details: config.fetch_details,
        }
    }
}

/// Worker pool orchestrator for one crawl run
pub struct Orchestrator {
    fetcher: Arc<PageFetcher>,
    selectors: Arc<SelectorSet>,
    sink: Arc<RowSink>,
    settings: CrawlSettings,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<PageFetcher>,
        selectors: Arc<SelectorSet>,
        sink: Arc<RowSink>,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            fetcher,
            selectors,
            sink,
            settings,
        }
    }

    /// Builds an orchestrator with a fresh pool over `factory`
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Config` if a configured selector does not compile.
    pub fn from_config(
        config: &Config,
        factory: Arc<dyn SessionFactory>,
        sink: Arc<RowSink>,
    ) -> Result<Self> {
        let selectors = SelectorSet::compile(&config.selectors)?;
        let pool = Arc::new(ResourcePool::new(factory));
        let fetcher = PageFetcher::new(pool, RetryPolicy::from(&config.crawler));

        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(selectors),
            sink,
            CrawlSettings::from(&config.crawler),
        ))
    }

    pub fn pool(&self) -> &Arc<ResourcePool> {
        self.fetcher.pool()
    }

    /// Runs a complete crawl from the seed page
    ///
    /// 1. Write the header
    /// 2. Fetch the seed and walk the taxonomy
    /// 3. Run the worker pool over the leaves
    ///
    /// The session is released before this returns, whatever the outcome.
    pub async fn crawl(&self, seed: &Url) -> Result<CrawlReport> {
        self.sink.write_header(&OutputRow::HEADER)?;

        let leaves = match self.discover(seed).await {
            Ok(leaves) => leaves,
            Err(e) => {
                self.pool().release_all().await;
                return Err(e);
            }
        };

        self.run(leaves, self.settings.workers).await
    }

    /// Fetches the seed page and walks it into leaves
    ///
    /// Does not release the pool; the session is reused by the workers.
    ///
    /// # Errors
    ///
    /// * `CatalogError::BackendUnavailable` - no session could be built
    /// * `CatalogError::Seed` - the seed page could not be fetched
    pub async fn discover(&self, seed: &Url) -> Result<Leaves> {
        tracing::info!("Fetching seed page {}", seed);

        let document = self
            .fetcher
            .fetch(seed, &self.selectors.taxonomy.marker, self.settings.page_timeout)
            .await
            .map_err(|e| match e {
                CatalogError::Fetch(source) => CatalogError::Seed {
                    url: seed.to_string(),
                    source,
                },
                other => other,
            })?;

        Ok(walk(&document, &self.selectors.taxonomy))
    }

    /// Processes every leaf on `concurrency` workers
    ///
    /// Blocks until all workers have finished and the session has been
    /// released. Leaves are handed out in order but complete in any order.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error raised by a worker; remaining leaves are
    /// not dispatched once it occurs.
    pub async fn run<I>(&self, leaves: I, concurrency: usize) -> Result<CrawlReport>
    where
        I: IntoIterator<Item = ProductTypeLeaf>,
    {
        let started_at = Utc::now();
        let queue = LeafQueue::new(leaves);
        let total = queue.total();
        let workers = concurrency.max(1).min(total);

        tracing::info!(
            "Dispatching {} product types to {} workers",
            total,
            workers
        );

        let ctx = Arc::new(WorkerContext {
            queue,
            fetcher: self.fetcher.clone(),
            selectors: self.selectors.clone(),
            sink: self.sink.clone(),
            counters: RunCounters::default(),
            settings: self.settings,
        });

        let mut tasks = JoinSet::new();
        for id in 0..workers {
            tasks.spawn(worker_loop(id, ctx.clone()));
        }

        let mut next_id = workers;
        let mut fatal: Option<CatalogError> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    fatal.get_or_insert(e);
                }
                Err(join_error) => {
                    // The worker already counted and logged its in-flight leaf.
                    tracing::error!("Worker task ended abnormally: {}", join_error);
                    if !ctx.queue.is_closed() && ctx.queue.remaining() > 0 {
                        tasks.spawn(worker_loop(next_id, ctx.clone()));
                        next_id += 1;
                    }
                }
            }
        }

        let flushed = self.sink.flush();
        self.pool().release_all().await;

        let report = CrawlReport::from_counters(
            &ctx.counters,
            started_at,
            workers,
            total as u64,
            self.sink.rows_written(),
            self.pool().sessions_created(),
        );

        if let Some(e) = fatal {
            tracing::error!(
                "Run aborted: {} of {} product types processed, {} rows written",
                report.leaves_succeeded + report.leaves_failed,
                report.leaves_total,
                report.rows_written
            );
            return Err(e);
        }
        flushed?;

        tracing::info!(
            "Crawl complete: {} rows from {} product types ({} failed)",
            report.rows_written,
            report.leaves_succeeded,
            report.leaves_failed
        );

        Ok(report)
    }
}
