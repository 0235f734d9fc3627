use crate::config::types::{Config, CrawlerConfig, OutputConfig, SessionConfig};
use crate::extract::SelectorSet;
use crate::ConfigError;
use url::Url;

/// Largest worker pool the crawler accepts
pub const MAX_WORKERS: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_session_config(&config.session)?;
    validate_output_config(&config.output)?;
    SelectorSet::compile(&config.selectors)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_seed_url(&config.seed_url)?;

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.page_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "page_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.fetch_retries > 5 {
        return Err(ConfigError::Validation(format!(
            "fetch_retries must be <= 5, got {}",
            config.fetch_retries
        )));
    }

    Ok(())
}

/// Validates the seed URL: absolute, http or https
fn validate_seed_url(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed_url '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "seed_url '{}' must use http or https",
            seed
        )));
    }

    Ok(())
}

/// Validates session configuration
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv_path cannot be empty".to_string(),
        ));
    }

    match config.delimiter.as_bytes() {
        [b] if b.is_ascii() && *b != b'"' && *b != b'\n' && *b != b'\r' => Ok(()),
        _ => Err(ConfigError::Validation(format!(
            "delimiter must be a single ASCII character other than a quote or newline, got '{}'",
            config.delimiter
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_seed_url() {
        assert!(validate_seed_url("https://shop.example/").is_ok());
        assert!(validate_seed_url("http://127.0.0.1:8080/").is_ok());

        assert!(validate_seed_url("").is_err());
        assert!(validate_seed_url("shop.example").is_err());
        assert!(validate_seed_url("ftp://shop.example/").is_err());
    }

    #[test]
    fn test_validate_workers_bounds() {
        let mut config = Config::default();
        config.crawler.workers = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.crawler.workers = MAX_WORKERS + 1;
        assert!(validate(&config).is_err());

        config.crawler.workers = MAX_WORKERS;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_timeouts() {
        let mut config = Config::default();
        config.crawler.page_timeout_secs = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.session.connect_timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_delimiter() {
        let mut output = OutputConfig::default();
        for ok in [",", ";", "\t", "|"] {
            output.delimiter = ok.to_string();
            assert!(validate_output_config(&output).is_ok(), "{:?}", ok);
        }
        for bad in ["", ";;", "\"", "\n", "é"] {
            output.delimiter = bad.to_string();
            assert!(validate_output_config(&output).is_err(), "{:?}", bad);
        }
    }

    #[test]
    fn test_validate_selectors() {
        let mut config = Config::default();
        config.selectors.listing.product_card = "div[".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSelector(_))
        ));
    }
}
