//! Page fetcher: navigation, readiness check, and retry budget
//!
//! A fetch is successful only when the page loaded within its time budget and
//! the readiness marker is present in the markup. Retryable failures get a
//! fixed number of further attempts.

use crate::config::CrawlerConfig;
use crate::extract::{has_marker, Css};
use crate::session::{Document, FailureKind, FetchError, ResourcePool, SessionHandle};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// How often a failed fetch is re-attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub retries: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            delay: Duration::ZERO,
        }
    }
}

impl From<&CrawlerConfig> for RetryPolicy {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            retries: config.fetch_retries,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// Turns URLs into realized documents through the pool's session
pub struct PageFetcher {
    pool: Arc<ResourcePool>,
    policy: RetryPolicy,
}

impl PageFetcher {
    pub fn new(pool: Arc<ResourcePool>, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&self) -> &Arc<ResourcePool> {
        &self.pool
    }

    /// Fetches `url` and waits for `marker` to be present
    ///
    /// # Errors
    ///
    /// * `CatalogError::BackendUnavailable` - the pool has no usable session (fatal)
    /// * `CatalogError::Fetch` - every attempt failed (recoverable)
    pub async fn fetch(&self, url: &Url, marker: &Css, timeout: Duration) -> Result<Document> {
        let session = self.pool.acquire().await?;

        let mut attempt = 0;
        loop {
            match Self::attempt(&session, url, marker, timeout).await {
                Ok(document) => return Ok(document),
                Err(err) if attempt < self.policy.retries && err.kind.is_retryable() => {
                    attempt += 1;
                    tracing::debug!(
                        "Retrying {} after {} (attempt {} of {})",
                        url,
                        err.kind,
                        attempt + 1,
                        self.policy.retries + 1
                    );
                    if !self.policy.delay.is_zero() {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn attempt(
        session: &SessionHandle,
        url: &Url,
        marker: &Css,
        timeout: Duration,
    ) -> std::result::Result<Document, FetchError> {
        let markup = session.navigate(url, timeout).await?;

        let ready = has_marker(&scraper::Html::parse_document(&markup), marker);
        if !ready {
            return Err(FetchError::new(
                FailureKind::MissingMarker,
                url.as_str(),
                format!("'{}' not found", marker),
            ));
        }

        Ok(Document::new(url.clone(), markup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{Reply, ScriptedFactory};
    use crate::CatalogError;
    use std::collections::HashMap;

    const URL: &str = "https://shop.example/lipstick";

    fn fetcher(routes: HashMap<String, Reply>, policy: RetryPolicy) -> (PageFetcher, Arc<crate::session::testing::Probe>) {
        let factory = ScriptedFactory::new(routes);
        let probe = factory.probe.clone();
        let pool = Arc::new(ResourcePool::new(Arc::new(factory)));
        (PageFetcher::new(pool, policy), probe)
    }

    fn once() -> RetryPolicy {
        RetryPolicy {
            retries: 1,
            delay: Duration::from_millis(1),
        }
    }

    fn marker() -> Css {
        Css::parse(".product-listing").unwrap()
    }

    fn listing() -> String {
        r#"<div class="product-listing"></div>"#.to_string()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let routes = HashMap::from([(URL.to_string(), Reply::Page(listing()))]);
        let (fetcher, probe) = fetcher(routes, once());

        let url = Url::parse(URL).unwrap();
        let doc = fetcher.fetch(&url, &marker(), Duration::from_secs(1)).await.unwrap();
        assert!(doc.markup().contains("product-listing"));
        assert_eq!(probe.visits(URL), 1);
    }

    #[tokio::test]
    async fn test_missing_marker_is_not_retried() {
        let routes = HashMap::from([(URL.to_string(), Reply::Page("<p>captcha</p>".to_string()))]);
        let (fetcher, probe) = fetcher(routes, once());

        let url = Url::parse(URL).unwrap();
        let err = fetcher
            .fetch(&url, &marker(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Fetch(FetchError { kind: FailureKind::MissingMarker, .. })
        ));
        assert_eq!(probe.visits(URL), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_retried_once() {
        let routes = HashMap::from([(
            URL.to_string(),
            Reply::FlakyThenPage(1, FailureKind::Network, listing()),
        )]);
        let (fetcher, probe) = fetcher(routes, once());

        let url = Url::parse(URL).unwrap();
        assert!(fetcher.fetch(&url, &marker(), Duration::from_secs(1)).await.is_ok());
        assert_eq!(probe.visits(URL), 2);
    }

    #[tokio::test]
    async fn test_retry_budget_is_bounded() {
        let routes = HashMap::from([(
            URL.to_string(),
            Reply::FlakyThenPage(5, FailureKind::Status(503), listing()),
        )]);
        let (fetcher, probe) = fetcher(routes, once());

        let url = Url::parse(URL).unwrap();
        let err = fetcher
            .fetch(&url, &marker(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(probe.visits(URL), 2);
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let routes = HashMap::from([(URL.to_string(), Reply::Fail(FailureKind::Status(404)))]);
        let (fetcher, probe) = fetcher(routes, once());

        let url = Url::parse(URL).unwrap();
        assert!(fetcher.fetch(&url, &marker(), Duration::from_secs(1)).await.is_err());
        assert_eq!(probe.visits(URL), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_recoverable() {
        let routes = HashMap::from([(
            URL.to_string(),
            Reply::Slow(Duration::from_millis(200), listing()),
        )]);
        let (fetcher, _) = fetcher(routes, RetryPolicy::none());

        let url = Url::parse(URL).unwrap();
        let err = fetcher
            .fetch(&url, &marker(), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Fetch(FetchError { kind: FailureKind::Timeout, .. })
        ));
    }

    #[tokio::test]
    async fn test_backend_unavailable_is_fatal() {
        let pool = Arc::new(ResourcePool::new(Arc::new(ScriptedFactory::unavailable())));
        let fetcher = PageFetcher::new(pool, once());

        let url = Url::parse(URL).unwrap();
        let err = fetcher
            .fetch(&url, &marker(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, CatalogError::BackendUnavailable { .. }));
    }
}
