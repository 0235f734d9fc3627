//! Catalog-Ripple main entry point
//!
//! This is the command-line interface for the Catalog-Ripple catalog crawler.

use catalog_ripple::config::{load_config_with_hash, validate, Config};
use catalog_ripple::crawler::{discover_leaves, run_crawl};
use catalog_ripple::output::print_report;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Ripple: a concurrent retail catalog crawler
///
/// Catalog-Ripple walks a retailer's category menu from a seed page, crawls
/// every product-type page on a pool of workers sharing one session, and
/// writes one delimited row per product.
#[derive(Parser, Debug)]
#[command(name = "catalog-ripple")]
#[command(version = "1.0.0")]
#[command(about = "A concurrent retail catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Seed page holding the category menu
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Output file path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Skip product detail pages; rating and description stay empty
    #[arg(long)]
    no_details: bool,

    /// Fetch the seed page and list product types without crawling them
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    apply_overrides(&mut config, &cli);

    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    if cli.dry_run {
        handle_dry_run(&config).await?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise the level follows `-v` / `-q`.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("catalog_ripple=info,warn"),
                1 => EnvFilter::new("catalog_ripple=debug,info"),
                2 => EnvFilter::new("catalog_ripple=trace,debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Command-line flags take precedence over the config file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(seed) = &cli.seed {
        config.crawler.seed_url = seed.clone();
    }
    if let Some(output) = &cli.output {
        config.output.csv_path = output.display().to_string();
    }
    if cli.no_details {
        config.crawler.fetch_details = false;
    }
}

/// Handles the --dry-run mode: shows the configuration and discovered product types
async fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Catalog-Ripple Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed: {}", config.crawler.seed_url);
    println!("  Workers: {}", config.crawler.workers);
    println!("  Page timeout: {}s", config.crawler.page_timeout_secs);
    println!("  Fetch retries: {}", config.crawler.fetch_retries);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Detail pages: {}", config.crawler.fetch_details);

    println!("\nOutput:");
    println!("  File: {}", config.output.csv_path);
    println!("  Delimiter: {:?}", config.output.delimiter);

    let leaves = match discover_leaves(config).await {
        Ok(leaves) => leaves,
        Err(e) => {
            tracing::error!("Discovery failed: {}", e);
            return Err(e.into());
        }
    };

    println!("\nProduct Types ({}):", leaves.len());
    for leaf in &leaves {
        println!("  - {}", leaf);
        println!("    * {}", leaf.link);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} product types", leaves.len());

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Starting crawl from {} (details: {})",
        config.crawler.seed_url,
        config.crawler.fetch_details
    );

    match run_crawl(config).await {
        Ok(report) => {
            tracing::info!("Crawl completed successfully");
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
