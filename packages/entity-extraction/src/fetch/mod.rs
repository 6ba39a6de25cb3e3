//! Link metadata fetching.
//!
//! [`MetadataFetcher`] turns one URL into one [`MetadataRecord`]: admit the
//! URL, look it up in the cache, fetch and parse on a miss, then store the
//! result. It never fails; every problem becomes an error record.

pub mod guard;
pub mod parse;
pub mod source;

use tracing::debug;
use url::Url;

use crate::cache::{CacheAdapter, CacheHandle};
use crate::error::FetchResult;
use crate::types::config::{CacheOptions, FetchOptions};
use crate::types::metadata::MetadataRecord;

pub use guard::UrlGuard;
pub use parse::parse_metadata;
pub use source::{FetchedPage, HttpSource, PageSource};

/// Cache key for a URL: scheme, host, non-default port and path.
///
/// Query string and fragment are dropped, as is a trailing `/` on any path
/// but the root, so `https://a.com/x/?utm=1#top` and `https://a.com/x`
/// share an entry.
pub fn cache_key(url: &Url) -> String {
    let mut key = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        key.push(':');
        key.push_str(&port.to_string());
    }

    let path = url.path().trim_end_matches('/');
    if path.is_empty() {
        key.push('/');
    } else {
        key.push_str(path);
    }
    key
}

/// Fetches link previews through a [`PageSource`] with cache-aside lookups.
pub struct MetadataFetcher<S: PageSource = HttpSource> {
    source: S,
    guard: UrlGuard,
}

impl MetadataFetcher<HttpSource> {
    /// HTTP fetcher configured from `options`.
    pub fn new(options: FetchOptions) -> FetchResult<Self> {
        let guard = UrlGuard::new(options.block_private_hosts);
        Self::with_guard(options, guard)
    }

    /// HTTP fetcher admitting URLs through `guard`, including every
    /// redirect hop.
    pub fn with_guard(options: FetchOptions, guard: UrlGuard) -> FetchResult<Self> {
        let source = HttpSource::with_guard(&options, guard.clone())?;
        Ok(Self::with_source_and_guard(source, guard))
    }
}

impl<S: PageSource> MetadataFetcher<S> {
    /// Fetcher over a custom page source.
    pub fn with_source(source: S, options: FetchOptions) -> Self {
        Self::with_source_and_guard(source, UrlGuard::new(options.block_private_hosts))
    }

    /// Fetcher over a custom page source with an explicit guard.
    pub fn with_source_and_guard(source: S, guard: UrlGuard) -> Self {
        Self { source, guard }
    }

    /// Parse and admit `url` without fetching it.
    pub fn admit(&self, url: &str) -> FetchResult<Url> {
        self.guard.check(url)
    }

    /// Metadata for `url`, served from `cache` when possible.
    ///
    /// Rejected URLs return an error record without touching the cache or
    /// the network. Failed fetches are stored only if the cache options ask
    /// for negative caching.
    pub async fn fetch_metadata(&self, url: &str, cache: &CacheAdapter<'_>) -> MetadataRecord {
        let url = match self.admit(url) {
            Ok(url) => url,
            Err(err) => {
                debug!(url = %url, error = %err, "link rejected");
                return err.into();
            }
        };

        let key = cache_key(&url);
        if let Some(record) = cache.get(&key).await {
            debug!(key = %key, "metadata cache hit");
            return record;
        }

        let record = self.fetch_uncached(&url).await;
        cache.store(&key, &record).await;
        record
    }

    /// Fetch and parse `url`, bypassing any cache.
    pub async fn fetch_uncached(&self, url: &Url) -> MetadataRecord {
        if let Err(err) = self.guard.check_resolved(url).await {
            debug!(url = %url, error = %err, "link resolves to a blocked address");
            return err.into();
        }

        match self.fetch_admitted(url).await {
            Ok(page) if page.is_html() => parse_metadata(&page.body, &page.final_url),
            Ok(page) => {
                debug!(
                    url = %url,
                    content_type = page.content_type.as_deref().unwrap_or_default(),
                    "not an HTML page, no metadata"
                );
                MetadataRecord::new()
            }
            Err(err) => {
                debug!(url = %url, source = self.source.name(), error = %err, "metadata fetch failed");
                err.into()
            }
        }
    }

    /// Fetch `url` and admit the page only if it ended up somewhere the
    /// guard also accepts.
    async fn fetch_admitted(&self, url: &Url) -> FetchResult<FetchedPage> {
        let page = self.source.fetch(url).await?;
        if &page.final_url != url {
            self.guard.check(page.final_url.as_str())?;
        }
        Ok(page)
    }
}

/// Fetch the preview metadata of a single URL.
///
/// `cache: None` and [`CacheHandle::NoCache`] disable caching; `options:
/// None` uses [`FetchOptions::default`].
pub async fn extract_metadata(
    url: &str,
    cache: Option<&CacheHandle>,
    options: Option<&FetchOptions>,
) -> MetadataRecord {
    extract_metadata_with(url, cache, &CacheOptions::default(), options).await
}

/// [`extract_metadata`] with explicit cache options.
pub async fn extract_metadata_with(
    url: &str,
    cache: Option<&CacheHandle>,
    cache_options: &CacheOptions,
    options: Option<&FetchOptions>,
) -> MetadataRecord {
    let options = options.cloned().unwrap_or_default();

    // Rejections never need an HTTP client
    if let Err(err) = UrlGuard::new(options.block_private_hosts).check(url) {
        return err.into();
    }

    let fetcher = match MetadataFetcher::new(options) {
        Ok(fetcher) => fetcher,
        Err(err) => return err.into(),
    };
    fetcher
        .fetch_metadata(url, &CacheAdapter::new(cache, cache_options))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::FetchError;
    use crate::testing::MockSource;

    fn key(url: &str) -> String {
        cache_key(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_cache_key_normalization() {
        assert_eq!(key("https://a.com/x/?utm=1#top"), "https://a.com/x");
        assert_eq!(key("https://a.com/x"), "https://a.com/x");
        assert_eq!(key("https://A.com"), "https://a.com/");
        assert_eq!(key("https://a.com/"), "https://a.com/");
        assert_eq!(key("https://a.com:443/p"), "https://a.com/p");
        assert_eq!(key("http://a.com:8080/p"), "http://a.com:8080/p");
        assert_ne!(key("http://a.com/p"), key("https://a.com/p"));
    }

    fn fetcher(source: MockSource) -> MetadataFetcher<MockSource> {
        MetadataFetcher::with_source(source, FetchOptions::default())
    }

    const PAGE: &str = r#"<meta property="og:title" content="Hello">"#;

    #[tokio::test]
    async fn test_fetch_parses_page() {
        let source = MockSource::new().with_html("https://a.com/", PAGE);
        let options = CacheOptions::default();
        let record = fetcher(source)
            .fetch_metadata("https://a.com/", &CacheAdapter::disabled(&options))
            .await;
        assert_eq!(record.title(), Some("Hello"));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_fetch() {
        let source = MockSource::new().with_html("https://a.com/post", PAGE);
        let fetcher = fetcher(source.clone());
        let handle = CacheHandle::from(MemoryCache::new());
        let options = CacheOptions::default();
        let cache = CacheAdapter::new(Some(&handle), &options);

        let first = fetcher.fetch_metadata("https://a.com/post", &cache).await;
        let second = fetcher.fetch_metadata("https://a.com/post?ref=x", &cache).await;

        assert_eq!(first, second);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_errors_refetch_without_negative_cache() {
        let source = MockSource::new().with_error("https://a.com/gone", FetchError::Status(404));
        let fetcher = fetcher(source.clone());
        let handle = CacheHandle::memory();
        let options = CacheOptions::default();
        let cache = CacheAdapter::new(Some(&handle), &options);

        for _ in 0..2 {
            let record = fetcher.fetch_metadata("https://a.com/gone", &cache).await;
            assert_eq!(record.error(), Some("http_404"));
        }
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_rejected_url_never_reaches_source() {
        let source = MockSource::new();
        let fetcher = fetcher(source.clone());
        let options = CacheOptions::default();

        let record = fetcher
            .fetch_metadata("not a url", &CacheAdapter::disabled(&options))
            .await;

        assert_eq!(record.error(), Some("invalid_url"));
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_blocked_host_when_enabled() {
        let source = MockSource::new().with_html("http://127.0.0.1/", PAGE);
        let fetcher = MetadataFetcher::with_source(
            source.clone(),
            FetchOptions::default().with_block_private_hosts(true),
        );
        let options = CacheOptions::default();

        let record = fetcher
            .fetch_metadata("http://127.0.0.1/", &CacheAdapter::disabled(&options))
            .await;

        assert_eq!(record.error(), Some("blocked_host"));
        assert_eq!(source.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_non_html_page_yields_empty_record() {
        let url = Url::parse("https://a.com/data.json").unwrap();
        let page = FetchedPage::html(url.clone(), PAGE).with_content_type("application/json");
        let source = MockSource::new().with_page(url.as_str(), page);

        let record = fetcher(source).fetch_uncached(&url).await;
        assert!(record.is_empty());
    }

    #[tokio::test]
    async fn test_redirect_to_blocked_host_is_discarded() {
        let url = Url::parse("https://a.com/start").unwrap();
        let landed = Url::parse("http://internal.corp/secret").unwrap();
        let source = MockSource::new().with_page(url.as_str(), FetchedPage::html(landed, PAGE));
        let guard = UrlGuard::permissive().block_host("internal.corp");
        let fetcher = MetadataFetcher::with_source_and_guard(source.clone(), guard);

        let record = fetcher.fetch_uncached(&url).await;

        assert_eq!(record.error(), Some("blocked_host"));
        assert_eq!(record.title(), None);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_redirect_to_allowed_host_is_kept() {
        let url = Url::parse("https://a.com/start").unwrap();
        let landed = Url::parse("https://b.com/end").unwrap();
        let source = MockSource::new().with_page(url.as_str(), FetchedPage::html(landed, PAGE));

        let record = fetcher(source).fetch_uncached(&url).await;
        assert_eq!(record.title(), Some("Hello"));
    }

    #[tokio::test]
    async fn test_http_fetcher_shares_guard() {
        let guard = UrlGuard::permissive().block_host("blocked.test");
        let fetcher = MetadataFetcher::with_guard(FetchOptions::default(), guard).unwrap();

        assert!(fetcher.admit("https://ok.test/").is_ok());
        assert!(matches!(
            fetcher.admit("https://blocked.test/"),
            Err(FetchError::BlockedHost(_))
        ));
    }

    #[tokio::test]
    async fn test_extract_metadata_invalid_url() {
        let record = extract_metadata("::::", None, None).await;
        assert_eq!(record.error(), Some("invalid_url"));
    }
}
