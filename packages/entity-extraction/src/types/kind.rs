//! The closed set of entity kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ExtractionError;

/// An entity kind the engine can extract.
///
/// Variants are declared in precedence order (highest first): when two kinds
/// match overlapping text, the earlier variant keeps the span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionKind {
    Links,
    Emails,
    Mentions,
    Hashtags,
    Images,
    Phones,
    Dates,
    MarkdownTables,
    MarkdownCode,
}

impl ExtractionKind {
    /// All kinds, highest precedence first.
    pub const ALL: [ExtractionKind; 9] = [
        ExtractionKind::Links,
        ExtractionKind::Emails,
        ExtractionKind::Mentions,
        ExtractionKind::Hashtags,
        ExtractionKind::Images,
        ExtractionKind::Phones,
        ExtractionKind::Dates,
        ExtractionKind::MarkdownTables,
        ExtractionKind::MarkdownCode,
    ];

    /// Position in the precedence order (0 is highest).
    pub fn precedence(self) -> usize {
        self as usize
    }

    /// Kinds that outrank this one, highest first.
    pub fn higher(self) -> &'static [ExtractionKind] {
        &PRECEDENCE[..self.precedence()]
    }

    /// Canonical snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionKind::Links => "links",
            ExtractionKind::Emails => "emails",
            ExtractionKind::Mentions => "mentions",
            ExtractionKind::Hashtags => "hashtags",
            ExtractionKind::Images => "images",
            ExtractionKind::Phones => "phones",
            ExtractionKind::Dates => "dates",
            ExtractionKind::MarkdownTables => "markdown_tables",
            ExtractionKind::MarkdownCode => "markdown_code",
        }
    }
}

static PRECEDENCE: [ExtractionKind; 9] = ExtractionKind::ALL;

impl fmt::Display for ExtractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionKind {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "links" | "link" | "urls" => ExtractionKind::Links,
            "emails" | "email" => ExtractionKind::Emails,
            "mentions" | "mention" => ExtractionKind::Mentions,
            "hashtags" | "hashtag" | "tags" => ExtractionKind::Hashtags,
            "images" | "image" => ExtractionKind::Images,
            "phones" | "phone" => ExtractionKind::Phones,
            "dates" | "date" => ExtractionKind::Dates,
            "markdown_tables" | "tables" => ExtractionKind::MarkdownTables,
            "markdown_code" | "code" => ExtractionKind::MarkdownCode,
            _ => {
                return Err(ExtractionError::UnknownKind {
                    name: s.to_string(),
                })
            }
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_matches_declaration_order() {
        for (i, kind) in ExtractionKind::ALL.iter().enumerate() {
            assert_eq!(kind.precedence(), i);
        }
        assert!(ExtractionKind::Links.higher().is_empty());
        assert_eq!(
            ExtractionKind::Mentions.higher(),
            &[ExtractionKind::Links, ExtractionKind::Emails]
        );
    }

    #[test]
    fn test_parse_names_and_aliases() {
        assert_eq!("links".parse::<ExtractionKind>(), Ok(ExtractionKind::Links));
        assert_eq!("tags".parse::<ExtractionKind>(), Ok(ExtractionKind::Hashtags));
        assert_eq!("Markdown-Code".parse::<ExtractionKind>(), Ok(ExtractionKind::MarkdownCode));
        for kind in ExtractionKind::ALL {
            assert_eq!(kind.as_str().parse::<ExtractionKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let err = "colors".parse::<ExtractionKind>().unwrap_err();
        assert_eq!(
            err,
            ExtractionError::UnknownKind {
                name: "colors".to_string()
            }
        );
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&ExtractionKind::MarkdownTables).unwrap();
        assert_eq!(json, "\"markdown_tables\"");
    }
}
