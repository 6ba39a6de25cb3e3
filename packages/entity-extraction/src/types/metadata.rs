//! Page-preview metadata records and link objects.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Key holding the failure reason of an unsuccessful fetch.
pub const ERROR_KEY: &str = "error";

/// Preview properties read from a page, in output order.
pub const PROPERTY_NAMES: [&str; 6] = ["title", "description", "image", "site_name", "type", "url"];

/// A flat mapping of preview property name to value.
///
/// A failed fetch produces a record with a single `error` entry. Properties
/// a page does not declare are absent rather than empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataRecord {
    properties: IndexMap<String, String>,
}

impl MetadataRecord {
    /// Create an empty (successful) record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a failed record carrying only an `error` entry.
    pub fn from_error(error: impl Into<String>) -> Self {
        let mut properties = IndexMap::with_capacity(1);
        properties.insert(ERROR_KEY.to_string(), error.into());
        Self { properties }
    }

    /// Add a property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a property, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Look up a property.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// The failure reason, if this record describes a failed fetch.
    pub fn error(&self) -> Option<&str> {
        self.get(ERROR_KEY)
    }

    pub fn is_error(&self) -> bool {
        self.properties.contains_key(ERROR_KEY)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    pub fn description(&self) -> Option<&str> {
        self.get("description")
    }

    pub fn image(&self) -> Option<&str> {
        self.get("image")
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterate properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<FetchError> for MetadataRecord {
    fn from(err: FetchError) -> Self {
        Self::from_error(err.to_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetadataRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            properties: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A link found in text, optionally enriched with its preview metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkObject {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataRecord>,
}

impl LinkObject {
    /// A bare link with no metadata.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            metadata: None,
        }
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: MetadataRecord) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The enrichment failure reason, if any.
    pub fn error(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(MetadataRecord::error)
    }
}
