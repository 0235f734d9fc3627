use serde::Deserialize;

/// Main configuration structure for Catalog-Ripple
///
/// Every table and key is optional; a missing config file is equivalent to
/// an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub session: SessionConfig,
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Page holding the category → subcategory → product-type menu
    pub seed_url: String,

    /// Number of concurrent workers draining product-type pages
    pub workers: usize,

    /// Upper bound for one fetch attempt, readiness check included (seconds)
    pub page_timeout_secs: u64,

    /// Extra attempts after a retryable fetch failure
    pub fetch_retries: u32,

    /// Pause between fetch attempts (milliseconds)
    pub retry_delay_ms: u64,

    /// Pause a worker takes after finishing a product-type page (milliseconds)
    pub request_delay_ms: u64,

    /// Whether each product's detail page is fetched for rating and description
    pub fetch_details: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: "https://www.nykaa.com/".to_string(),
            workers: 5,
            page_timeout_secs: 10,
            fetch_retries: 1,
            retry_delay_ms: 500,
            request_delay_ms: 1000,
            fetch_details: true,
        }
    }
}

/// Fetch session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionConfig {
    /// User agent presented by the session
    pub user_agent: String,

    /// TCP connect timeout (seconds)
    pub connect_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/110.0.5481.100 Safari/537.36"
                .to_string(),
            connect_timeout_secs: 10,
        }
    }
}

/// CSS selectors for each page kind
///
/// Field selectors accept an optional `@attribute` suffix; without it the
/// element's text is taken.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub taxonomy: TaxonomySelectors,
    pub listing: ListingSelectors,
    pub detail: DetailSelectors,
}

/// Selectors applied to the seed page
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TaxonomySelectors {
    /// Readiness marker for the seed page
    pub marker: String,

    /// One element per top-level category; its first anchor names the category
    pub category_block: String,

    /// Subcategory headings inside a category block
    pub subcategory_heading: String,

    /// List element following a heading; each anchor inside is a product type
    pub product_type_list: String,
}

impl Default for TaxonomySelectors {
    fn default() -> Self {
        Self {
            marker: "h1".to_string(),
            category_block: "li.category-menu".to_string(),
            subcategory_heading: ".subcategory-heading".to_string(),
            product_type_list: "ul".to_string(),
        }
    }
}

/// Selectors applied to a product-type page
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ListingSelectors {
    pub marker: String,
    pub product_card: String,
    pub name: String,
    pub price: String,
    pub discount: String,
    pub detail_link: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            marker: ".product-listing".to_string(),
            product_card: ".product-listing .product-card".to_string(),
            name: ".product-name".to_string(),
            price: ".product-price".to_string(),
            discount: ".product-discount".to_string(),
            detail_link: "a[href]@href".to_string(),
        }
    }
}

/// Selectors applied to a product detail page
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DetailSelectors {
    pub marker: String,
    pub rating: String,
    pub rating_count: String,
    pub description: String,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            marker: "h1".to_string(),
            rating: ".product-rating".to_string(),
            rating_count: ".product-rating-count".to_string(),
            description: ".product-description".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the delimited output table
    pub csv_path: String,

    /// Field delimiter, a single ASCII character
    pub delimiter: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "catalog.csv".to_string(),
            delimiter: ",".to_string(),
        }
    }
}

impl OutputConfig {
    /// The delimiter as the byte the csv writer expects
    ///
    /// Falls back to a comma for anything that is not exactly one ASCII
    /// character; validation rejects such values before a crawl starts.
    pub fn delimiter_byte(&self) -> u8 {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => *b,
            _ => b',',
        }
    }
}
