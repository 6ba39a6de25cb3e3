//! Preview metadata parsing from HTML `<head>` markup.
//!
//! Reads Open Graph (`og:*`), Twitter card (`twitter:*`) and plain HTML
//! (`<title>`, `<meta name="description">`, `<link rel="canonical">`)
//! declarations. For each property the most specific source wins:
//! Open Graph, then Twitter, then plain HTML. Among equally specific
//! declarations the first one in the document wins.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

use crate::types::metadata::{MetadataRecord, PROPERTY_NAMES};

static RE_META: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<meta\b([^>]*)>").unwrap());

static RE_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<link\b([^>]*)>").unwrap());

static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());

static RE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .unwrap()
});

static RE_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)&(#x[0-9a-f]{1,6}|#[0-9]{1,7}|[a-z]{2,6});").unwrap());

/// Declaration specificity, lower is better.
type Rank = u8;

const OPEN_GRAPH: Rank = 0;
const TWITTER: Rank = 1;
const HTML: Rank = 2;

/// Map a `<meta>` property/name to the record property it fills.
fn meta_slot(name: &str) -> Option<(&'static str, Rank)> {
    let slot = match name {
        "og:title" => ("title", OPEN_GRAPH),
        "og:description" => ("description", OPEN_GRAPH),
        "og:image" | "og:image:url" | "og:image:secure_url" => ("image", OPEN_GRAPH),
        "og:site_name" => ("site_name", OPEN_GRAPH),
        "og:type" => ("type", OPEN_GRAPH),
        "og:url" => ("url", OPEN_GRAPH),
        "twitter:title" => ("title", TWITTER),
        "twitter:description" => ("description", TWITTER),
        "twitter:image" | "twitter:image:src" => ("image", TWITTER),
        "twitter:url" => ("url", TWITTER),
        "description" => ("description", HTML),
        "application-name" => ("site_name", HTML),
        _ => return None,
    };
    Some(slot)
}

#[derive(Default)]
struct Candidates {
    best: HashMap<&'static str, (Rank, String)>,
}

impl Candidates {
    fn offer(&mut self, slot: &'static str, rank: Rank, value: &str) {
        let value = clean_text(value);
        if value.is_empty() {
            return;
        }
        let better = self.best.get(slot).map_or(true, |(held, _)| rank < *held);
        if better {
            self.best.insert(slot, (rank, value));
        }
    }

    fn into_record(mut self, base_url: &Url) -> MetadataRecord {
        PROPERTY_NAMES
            .iter()
            .filter_map(|&name| {
                let (_, value) = self.best.remove(name)?;
                let value = match name {
                    "image" | "url" => resolve(base_url, &value),
                    _ => value,
                };
                Some((name, value))
            })
            .collect()
    }
}

/// Parse preview metadata out of an HTML document.
///
/// Relative `image` and `url` values are resolved against `base_url`
/// (normally the final URL after redirects). A document that declares
/// nothing yields an empty record.
pub fn parse_metadata(html: &str, base_url: &Url) -> MetadataRecord {
    let mut candidates = Candidates::default();

    for tag in RE_META.captures_iter(html) {
        let attrs = attributes(&tag[1]);
        let Some(content) = attrs.get("content") else {
            continue;
        };
        let name = attrs
            .get("property")
            .or_else(|| attrs.get("name"))
            .map(|n| n.trim().to_ascii_lowercase());
        if let Some((slot, rank)) = name.as_deref().and_then(meta_slot) {
            candidates.offer(slot, rank, content);
        }
    }

    for tag in RE_LINK.captures_iter(html) {
        let attrs = attributes(&tag[1]);
        let is_canonical = attrs
            .get("rel")
            .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("canonical")));
        if let (true, Some(href)) = (is_canonical, attrs.get("href")) {
            candidates.offer("url", HTML, href);
        }
    }

    if let Some(title) = RE_TITLE.captures(html) {
        candidates.offer("title", HTML, &title[1]);
    }

    candidates.into_record(base_url)
}

/// Attribute name (lowercased) to raw value. First declaration wins.
fn attributes(tag_body: &str) -> HashMap<String, &str> {
    let mut attrs = HashMap::new();
    for cap in RE_ATTR.captures_iter(tag_body) {
        let value = cap
            .get(2)
            .or_else(|| cap.get(3))
            .or_else(|| cap.get(4))
            .map_or("", |m| m.as_str());
        attrs.entry(cap[1].to_ascii_lowercase()).or_insert(value);
    }
    attrs
}

/// Decode entities and collapse whitespace.
fn clean_text(raw: &str) -> String {
    decode_entities(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    RE_ENTITY
        .replace_all(raw, |cap: &Captures| {
            let entity = &cap[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse().ok().and_then(char::from_u32)
            } else {
                named_entity(&entity.to_ascii_lowercase())
            };
            decoded.map_or_else(|| cap[0].to_string(), String::from)
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "copy" => '\u{A9}',
        _ => return None,
    };
    Some(c)
}

fn resolve(base_url: &Url, value: &str) -> String {
    if Url::parse(value).is_ok() {
        return value.to_string();
    }
    base_url
        .join(value)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| value.to_string())
}
