//! Batch link enrichment.

use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use std::collections::HashMap;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::CacheAdapter;
use crate::error::FetchError;
use crate::fetch::{cache_key, MetadataFetcher, PageSource};
use crate::types::config::EnrichOptions;
use crate::types::metadata::{LinkObject, MetadataRecord};

/// URL to request for an extracted link. Scheme-less `www.` links are
/// fetched over plain HTTP and left to redirect.
pub fn fetch_target(link: &str) -> String {
    if link.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("www.")) {
        format!("http://{link}")
    } else {
        link.to_string()
    }
}

/// Attach metadata to every link, preserving order.
///
/// Each link is handled on its own: one failing fetch only sets that
/// link's `error`. Links sharing a cache key are fetched once. At most
/// `options.concurrency` fetches run at a time, and links still pending
/// when `options.deadline` elapses get a `timeout` error.
pub async fn enrich_links<S: PageSource>(
    links: &[String],
    fetcher: &MetadataFetcher<S>,
    cache: &CacheAdapter<'_>,
    options: &EnrichOptions,
) -> Vec<LinkObject> {
    let deadline = options.deadline.map(|d| Instant::now() + d);

    // key -> URL to fetch, in first-seen order
    let mut pending: IndexMap<String, String> = IndexMap::new();
    let mut link_keys = Vec::with_capacity(links.len());
    for link in links {
        let target = fetch_target(link);
        match fetcher.admit(&target) {
            Ok(url) => {
                let key = cache_key(&url);
                pending.entry(key.clone()).or_insert(target);
                link_keys.push(Ok(key));
            }
            Err(err) => link_keys.push(Err(err)),
        }
    }

    debug!(
        links = links.len(),
        unique = pending.len(),
        concurrency = options.concurrency,
        "enriching links"
    );

    let records: HashMap<String, MetadataRecord> = stream::iter(pending)
        .map(|(key, target)| async move {
            let fetch = fetcher.fetch_metadata(&target, cache);
            let record = match deadline {
                Some(at) => tokio::time::timeout_at(at, fetch)
                    .await
                    .unwrap_or_else(|_| MetadataRecord::from(FetchError::Timeout)),
                None => fetch.await,
            };
            (key, record)
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let failed = records.values().filter(|r| r.is_error()).count();
    if failed > 0 {
        info!(failed, total = records.len(), "some link metadata fetches failed");
    }

    links
        .iter()
        .zip(link_keys)
        .map(|(link, key)| {
            let record = match key {
                Ok(key) => records.get(&key).cloned().unwrap_or_default(),
                Err(err) => err.into(),
            };
            LinkObject::new(link.clone()).with_metadata(record)
        })
        .collect()
}
