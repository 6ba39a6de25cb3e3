//! Aggregate extraction output for one text.

use serde::{Deserialize, Serialize};

use super::kind::ExtractionKind;

/// Every entity kind extracted from one text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReport {
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub markdown_tables: Vec<String>,
    #[serde(default)]
    pub markdown_code: Vec<String>,
}

impl ExtractionReport {
    /// Values for one kind.
    pub fn get(&self, kind: ExtractionKind) -> &[String] {
        match kind {
            ExtractionKind::Links => &self.links,
            ExtractionKind::Emails => &self.emails,
            ExtractionKind::Mentions => &self.mentions,
            ExtractionKind::Hashtags => &self.hashtags,
            ExtractionKind::Images => &self.images,
            ExtractionKind::Phones => &self.phones,
            ExtractionKind::Dates => &self.dates,
            ExtractionKind::MarkdownTables => &self.markdown_tables,
            ExtractionKind::MarkdownCode => &self.markdown_code,
        }
    }

    pub(crate) fn set(&mut self, kind: ExtractionKind, values: Vec<String>) {
        let slot = match kind {
            ExtractionKind::Links => &mut self.links,
            ExtractionKind::Emails => &mut self.emails,
            ExtractionKind::Mentions => &mut self.mentions,
            ExtractionKind::Hashtags => &mut self.hashtags,
            ExtractionKind::Images => &mut self.images,
            ExtractionKind::Phones => &mut self.phones,
            ExtractionKind::Dates => &mut self.dates,
            ExtractionKind::MarkdownTables => &mut self.markdown_tables,
            ExtractionKind::MarkdownCode => &mut self.markdown_code,
        };
        *slot = values;
    }

    /// True when nothing was found.
    pub fn is_empty(&self) -> bool {
        ExtractionKind::ALL.iter().all(|k| self.get(*k).is_empty())
    }
}
