//! Run counters and the end-of-run report
//!
//! Workers bump [`RunCounters`] as they go; the orchestrator freezes them
//! into a [`CrawlReport`] once every worker has finished.

use crate::session::FailureKind;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Live counters shared by all workers
#[derive(Debug, Default)]
pub struct RunCounters {
    leaves_succeeded: AtomicU64,
    leaves_failed: AtomicU64,
    products: AtomicU64,
    details_fetched: AtomicU64,
    detail_failures: AtomicU64,
    failures: Mutex<HashMap<String, u64>>,
}

impl RunCounters {
    pub fn leaf_succeeded(&self, products: u64) {
        self.leaves_succeeded.fetch_add(1, Ordering::Relaxed);
        self.products.fetch_add(products, Ordering::Relaxed);
    }

    pub fn leaf_failed(&self, cause: &str) {
        self.leaves_failed.fetch_add(1, Ordering::Relaxed);
        self.record_failure(cause);
    }

    pub fn detail_fetched(&self) {
        self.details_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn detail_failed(&self, kind: FailureKind) {
        self.detail_failures.fetch_add(1, Ordering::Relaxed);
        self.record_failure(&format!("detail: {}", kind));
    }

    fn record_failure(&self, cause: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            *failures.entry(cause.to_string()).or_insert(0) += 1;
        }
    }

    pub fn leaves_done(&self) -> u64 {
        self.leaves_succeeded.load(Ordering::Relaxed) + self.leaves_failed.load(Ordering::Relaxed)
    }
}

/// Summary of one finished (or aborted) run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub workers: usize,
    pub leaves_total: u64,
    pub leaves_succeeded: u64,
    pub leaves_failed: u64,
    /// Leaves never picked up because the run aborted
    pub leaves_not_dispatched: u64,
    pub products: u64,
    pub details_fetched: u64,
    pub detail_failures: u64,
    pub rows_written: u64,
    pub sessions_created: usize,
    /// Failure causes and how often each occurred
    pub failures: HashMap<String, u64>,
}

impl CrawlReport {
    pub(crate) fn from_counters(
        counters: &RunCounters,
        started_at: DateTime<Utc>,
        workers: usize,
        leaves_total: u64,
        rows_written: u64,
        sessions_created: usize,
    ) -> Self {
        let leaves_succeeded = counters.leaves_succeeded.load(Ordering::Relaxed);
        let leaves_failed = counters.leaves_failed.load(Ordering::Relaxed);
        let failures = counters
            .failures
            .lock()
            .map(|f| f.clone())
            .unwrap_or_default();

        Self {
            started_at,
            finished_at: Utc::now(),
            workers,
            leaves_total,
            leaves_succeeded,
            leaves_failed,
            leaves_not_dispatched: leaves_total.saturating_sub(leaves_succeeded + leaves_failed),
            products: counters.products.load(Ordering::Relaxed),
            details_fetched: counters.details_fetched.load(Ordering::Relaxed),
            detail_failures: counters.detail_failures.load(Ordering::Relaxed),
            rows_written,
            sessions_created,
            failures,
        }
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Catalog Crawl Report ===\n");

    println!("Run:");
    println!("  Started:  {}", report.started_at.to_rfc3339());
    println!("  Finished: {}", report.finished_at.to_rfc3339());
    println!("  Duration: {}s", report.duration_seconds());
    println!("  Workers:  {}", report.workers);
    println!("  Sessions: {}", report.sessions_created);
    println!();

    println!("Product Types:");
    println!("  Discovered: {}", report.leaves_total);
    println!("  Succeeded:  {}", report.leaves_succeeded);
    println!("  Failed:     {}", report.leaves_failed);
    if report.leaves_not_dispatched > 0 {
        println!("  Not run:    {}", report.leaves_not_dispatched);
    }
    println!();

    println!("Products:");
    println!("  Found:             {}", report.products);
    println!("  Details fetched:   {}", report.details_fetched);
    println!("  Detail failures:   {}", report.detail_failures);
    println!("  Rows written:      {}", report.rows_written);
    println!();

    if !report.failures.is_empty() {
        println!("Failure Summary:");
        let mut failures: Vec<_> = report.failures.iter().collect();
        failures.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (cause, count) in failures {
            println!("  {}: {}", cause, count);
        }
        println!();
    }

    let success_rate = if report.leaves_total > 0 {
        (report.leaves_succeeded as f64 / report.leaves_total as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Success Rate: {:.1}% ({} / {} product types crawled)",
        success_rate, report.leaves_succeeded, report.leaves_total
    );
}
