//! # Entity Extraction
//!
//! Pulls structured entities out of free text (links, emails, @mentions,
//! #hashtags, image URLs, phone numbers, dates, markdown tables, fenced code
//! blocks) and optionally enriches links with page-preview metadata fetched
//! over HTTP.
//!
//! ## Overview
//!
//! - **Recognizers**: one pattern rule per [`ExtractionKind`]
//! - **Engine**: per-kind extraction with cross-kind precedence, so a URL
//!   fragment is never also a hashtag
//! - **Fetcher**: URL admission, bounded HTTP GET, Open Graph / Twitter card
//!   / HTML parsing into a [`MetadataRecord`]
//! - **Cache**: pluggable [`CacheBackend`]s behind a [`CacheAdapter`] that
//!   degrades to no caching instead of failing
//! - **Facade**: [`RichText`] wraps one text value
//!
//! ## Quick Start
//!
//! ```rust
//! use entity_extraction::{extract, ExtractionKind, RichText};
//!
//! let text = "Visit https://example.com and email foo@bar.com #ruby @alice";
//! assert_eq!(extract(text, ExtractionKind::Emails), vec!["foo@bar.com"]);
//!
//! let rich = RichText::new(text);
//! assert_eq!(rich.tags(), vec!["ruby"]);
//! ```
//!
//! Fetching previews:
//!
//! ```rust,no_run
//! use entity_extraction::{CacheHandle, CacheOptions, RichText};
//!
//! # async fn example() {
//! let cache = CacheHandle::memory();
//! let links = RichText::new("read https://example.com/post")
//!     .link_objects(true, Some(&cache), &CacheOptions::default())
//!     .await;
//! for link in links {
//!     println!("{} -> {:?}", link.url, link.metadata);
//! }
//! # }
//! ```

pub mod cache;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod facade;
pub mod fetch;
pub mod recognizers;
pub mod testing;
pub mod types;

// Re-export core types at crate root
pub use cache::{CacheAdapter, CacheBackend, CacheHandle, CacheRegistry, MemoryCache};
pub use engine::{contains, extract, extract_all, is_match, scan, EntityMatch};
pub use enrich::enrich_links;
pub use error::{CacheError, ExtractionError, FetchError, Result};
pub use facade::RichText;
pub use fetch::{
    cache_key, extract_metadata, extract_metadata_with, parse_metadata, FetchedPage, HttpSource,
    MetadataFetcher, PageSource, UrlGuard,
};
pub use types::config::{CacheOptions, EnrichOptions, FetchOptions};
pub use types::kind::ExtractionKind;
pub use types::metadata::{LinkObject, MetadataRecord};
pub use types::report::ExtractionReport;
