//! The per-text facade.

use crate::cache::{CacheAdapter, CacheHandle};
use crate::engine;
use crate::enrich::enrich_links;
use crate::fetch::{MetadataFetcher, PageSource};
use crate::types::config::{CacheOptions, EnrichOptions, FetchOptions};
use crate::types::kind::ExtractionKind;
use crate::types::metadata::{LinkObject, MetadataRecord};
use crate::types::report::ExtractionReport;

/// A text value with entity accessors.
///
/// # Example
///
/// ```rust
/// use entity_extraction::RichText;
///
/// let text = RichText::new("Visit https://example.com and email foo@bar.com #ruby @alice");
/// assert_eq!(text.links(), vec!["https://example.com"]);
/// assert_eq!(text.tags(), vec!["ruby"]);
/// assert_eq!(text.mentions(), vec!["alice"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    text: String,
}

impl RichText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Unique values of one kind, in order of first occurrence.
    pub fn extract(&self, kind: ExtractionKind) -> Vec<String> {
        engine::extract(&self.text, kind)
    }

    /// Every kind at once.
    pub fn report(&self) -> ExtractionReport {
        engine::extract_all(&self.text)
    }

    /// Whether the whole text is one entity of `kind`.
    pub fn is_match(&self, kind: ExtractionKind) -> bool {
        engine::is_match(&self.text, kind)
    }

    pub fn links(&self) -> Vec<String> {
        self.extract(ExtractionKind::Links)
    }

    pub fn mentions(&self) -> Vec<String> {
        self.extract(ExtractionKind::Mentions)
    }

    /// Hashtags without the leading `#`.
    pub fn tags(&self) -> Vec<String> {
        self.extract(ExtractionKind::Hashtags)
    }

    pub fn emails(&self) -> Vec<String> {
        self.extract(ExtractionKind::Emails)
    }

    pub fn phones(&self) -> Vec<String> {
        self.extract(ExtractionKind::Phones)
    }

    pub fn dates(&self) -> Vec<String> {
        self.extract(ExtractionKind::Dates)
    }

    pub fn images(&self) -> Vec<String> {
        self.extract(ExtractionKind::Images)
    }

    pub fn markdown_tables(&self) -> Vec<String> {
        self.extract(ExtractionKind::MarkdownTables)
    }

    pub fn markdown_code(&self) -> Vec<String> {
        self.extract(ExtractionKind::MarkdownCode)
    }

    /// Links as objects, optionally with preview metadata.
    ///
    /// Without metadata no network access happens. With metadata each link
    /// is fetched over HTTP with default [`FetchOptions`], sequentially.
    pub async fn link_objects(
        &self,
        with_metadata: bool,
        cache: Option<&CacheHandle>,
        cache_options: &CacheOptions,
    ) -> Vec<LinkObject> {
        let links = self.links();
        if !with_metadata || links.is_empty() {
            return links.into_iter().map(LinkObject::new).collect();
        }

        match MetadataFetcher::new(FetchOptions::default()) {
            Ok(fetcher) => {
                let cache = CacheAdapter::new(cache, cache_options);
                enrich_links(&links, &fetcher, &cache, &EnrichOptions::default()).await
            }
            Err(err) => {
                let record = MetadataRecord::from(err);
                links
                    .into_iter()
                    .map(|link| LinkObject::new(link).with_metadata(record.clone()))
                    .collect()
            }
        }
    }

    /// Links with metadata, through a caller-supplied fetcher.
    pub async fn link_objects_with<S: PageSource>(
        &self,
        fetcher: &MetadataFetcher<S>,
        enrich_options: &EnrichOptions,
        cache: Option<&CacheHandle>,
        cache_options: &CacheOptions,
    ) -> Vec<LinkObject> {
        let cache = CacheAdapter::new(cache, cache_options);
        enrich_links(&self.links(), fetcher, &cache, enrich_options).await
    }
}

impl From<&str> for RichText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for RichText {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl AsRef<str> for RichText {
    fn as_ref(&self) -> &str {
        &self.text
    }
}
