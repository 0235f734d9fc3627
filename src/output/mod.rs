//! Output module for crawl results
//!
//! This module handles:
//! - Flattening products into fixed-width output rows
//! - The shared, append-only row sink
//! - Run counters and the end-of-run report

mod row;
mod sink;
pub mod stats;

pub use row::{brand_of, OutputRow, ProductDetail, ProductSummary};
pub use sink::{RowSink, SinkError};
pub use stats::{print_report, CrawlReport, RunCounters};
