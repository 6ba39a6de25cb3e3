//! Test support: a scriptable [`PageSource`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::fetch::{FetchedPage, PageSource};

/// Page source with canned responses per URL.
///
/// Unknown URLs answer `http_404`. Clones share responses and call
/// tracking, so a test can keep a clone for assertions after handing the
/// source to a fetcher.
///
/// ```rust
/// use entity_extraction::testing::MockSource;
///
/// let source = MockSource::new()
///     .with_html("https://example.com", r#"<meta property="og:title" content="Hi">"#);
/// assert_eq!(source.fetch_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct MockSource {
    responses: Arc<RwLock<HashMap<String, FetchResult<FetchedPage>>>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    calls: Arc<RwLock<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

fn normalize(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with an HTML page (builder pattern).
    pub fn with_html(self, url: &str, html: &str) -> Self {
        let final_url = Url::parse(url).expect("mock page URL must be absolute");
        self.with_page(url, FetchedPage::html(final_url, html))
    }

    /// Answer `url` with a prepared page (builder pattern).
    pub fn with_page(self, url: &str, page: FetchedPage) -> Self {
        self.respond(url, Ok(page));
        self
    }

    /// Answer `url` with an error (builder pattern).
    pub fn with_error(self, url: &str, error: FetchError) -> Self {
        self.respond(url, Err(error));
        self
    }

    /// Delay the answer for `url` (builder pattern).
    pub fn with_delay(self, url: &str, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(normalize(url), delay);
        self
    }

    /// Set the response for `url`, replacing any previous one.
    pub fn respond(&self, url: &str, response: FetchResult<FetchedPage>) {
        self.responses
            .write()
            .unwrap()
            .insert(normalize(url), response);
    }

    /// URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Number of fetches of one URL.
    pub fn fetch_count_for(&self, url: &str) -> usize {
        let url = normalize(url);
        self.calls.read().unwrap().iter().filter(|c| **c == url).count()
    }

    /// Highest number of fetches observed in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Clear call tracking.
    pub fn reset_calls(&self) {
        self.calls.write().unwrap().clear();
        self.peak_in_flight.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageSource for MockSource {
    async fn fetch(&self, url: &Url) -> FetchResult<FetchedPage> {
        let key = url.to_string();
        self.calls.write().unwrap().push(key.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.read().unwrap().get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self
            .responses
            .read()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_and_unknown_responses() {
        let source = MockSource::new()
            .with_html("https://example.com", "<title>Hi</title>")
            .with_error("https://example.com/down", FetchError::Timeout);

        let page = source
            .fetch(&Url::parse("https://example.com/").unwrap())
            .await
            .unwrap();
        assert_eq!(page.body, "<title>Hi</title>");

        let down = source.fetch(&Url::parse("https://example.com/down").unwrap()).await;
        assert_eq!(down, Err(FetchError::Timeout));

        let missing = source.fetch(&Url::parse("https://other.com/").unwrap()).await;
        assert_eq!(missing, Err(FetchError::Status(404)));

        assert_eq!(source.fetch_count(), 3);
        assert_eq!(source.fetch_count_for("https://example.com"), 1);
    }

    #[tokio::test]
    async fn test_clones_share_tracking() {
        let source = MockSource::new();
        let clone = source.clone();
        let _ = clone.fetch(&Url::parse("https://a.com/").unwrap()).await;

        assert_eq!(source.calls(), vec!["https://a.com/".to_string()]);
        source.reset_calls();
        assert_eq!(clone.fetch_count(), 0);
    }
}
