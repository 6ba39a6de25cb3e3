//! Recognizer registry: one compiled pattern plus normalization per kind.
//!
//! Patterns are compiled on first use and shared read-only for the life of
//! the process. Several rules capture a one-character prefix group in place
//! of a look-behind (the `regex` crate has none); for those the entity span
//! is capture group 1, not the whole match.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::types::kind::ExtractionKind;

// =============================================================================
// Patterns
// =============================================================================

static RE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|[^\w@.\-/])((?:https?://|www\.)[^\s<>"'`\[\]{}|\\^]+)"#).unwrap()
});

// Email pattern - RFC 5322 simplified
static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9-]+(?:\.[A-Z0-9-]+)*\.[A-Z]{2,}\b").unwrap()
});

static RE_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\w@.])(@\w+)").unwrap());

// Tag body must contain a letter so "#1" stays a number
static RE_HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\w&#/])(#\w*\p{L}\w*)").unwrap());

// International "+CC NN NNNN ..." or North American "(NNN) NNN-NNNN"
static RE_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[^\w+(])(\+\d{1,3}(?:[\s.-]\d{2,4}){2,4}|(?:\+\d{1,3}[\s.-]?)?(?:\(\d{3}\)|\d{3})[\s.-]?\d{3}[\s.-]?\d{4})\b",
    )
    .unwrap()
});

static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    const MONTH: &str = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?";
    Regex::new(&format!(
        r"(?i)\b(?:\d{{4}}-\d{{2}}-\d{{2}}|\d{{1,2}}/\d{{1,2}}/\d{{2,4}}|{MONTH}\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s+\d{{4}}|\d{{1,2}}(?:st|nd|rd|th)?\s+{MONTH},?\s+\d{{4}})\b"
    ))
    .unwrap()
});

// Header row, |---| separator row, then any body rows
static RE_MARKDOWN_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*\|[^\n]*\|[ \t]*\r?\n[ \t]*\|[ \t]*:?-{3,}:?[ \t]*(?:\|[ \t]*:?-{3,}:?[ \t]*)*\|[ \t]*(?:\r?\n[ \t]*\|[^\n]*\|[ \t]*)*",
    )
    .unwrap()
});

static RE_MARKDOWN_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^[ \t]*```[^\n`]*\n(.*?)^[ \t]*```[ \t]*\r?$").unwrap()
});

const IMAGE_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg", ".bmp", ".ico", ".avif",
];

// =============================================================================
// Rules
// =============================================================================

/// How a raw match is turned into an extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalize {
    /// Keep the matched text as is.
    Verbatim,
    /// Drop trailing sentence punctuation and unbalanced closing brackets.
    /// The span shrinks with the value.
    TrimUrl,
    /// Drop the leading `@` or `#`.
    StripSigil,
    /// Trim surrounding whitespace.
    Trim,
    /// Drop trailing line breaks only, keeping indentation.
    TrimTrailingNewline,
}

/// A single recognized entity with its byte span in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    pub start: usize,
    pub end: usize,
    pub value: String,
}

/// A compiled pattern and normalization step for one kind.
pub struct RecognizerRule {
    pub kind: ExtractionKind,
    regex: &'static LazyLock<Regex>,
    /// Capture group whose span the entity occupies
    span_group: usize,
    /// Capture group whose text becomes the value
    value_group: usize,
    pub normalize: Normalize,
    /// Extra acceptance check on the normalized value
    accept: Option<fn(&str) -> bool>,
}

/// Indexed by `ExtractionKind::precedence()`.
static RULES: &[RecognizerRule] = &[
    RecognizerRule {
        kind: ExtractionKind::Links,
        regex: &RE_URL,
        span_group: 1,
        value_group: 1,
        normalize: Normalize::TrimUrl,
        accept: None,
    },
    RecognizerRule {
        kind: ExtractionKind::Emails,
        regex: &RE_EMAIL,
        span_group: 0,
        value_group: 0,
        normalize: Normalize::Verbatim,
        accept: None,
    },
    RecognizerRule {
        kind: ExtractionKind::Mentions,
        regex: &RE_MENTION,
        span_group: 1,
        value_group: 1,
        normalize: Normalize::StripSigil,
        accept: None,
    },
    RecognizerRule {
        kind: ExtractionKind::Hashtags,
        regex: &RE_HASHTAG,
        span_group: 1,
        value_group: 1,
        normalize: Normalize::StripSigil,
        accept: None,
    },
    RecognizerRule {
        kind: ExtractionKind::Images,
        regex: &RE_URL,
        span_group: 1,
        value_group: 1,
        normalize: Normalize::TrimUrl,
        accept: Some(is_image_url),
    },
    RecognizerRule {
        kind: ExtractionKind::Phones,
        regex: &RE_PHONE,
        span_group: 1,
        value_group: 1,
        normalize: Normalize::Trim,
        accept: None,
    },
    RecognizerRule {
        kind: ExtractionKind::Dates,
        regex: &RE_DATE,
        span_group: 0,
        value_group: 0,
        normalize: Normalize::Trim,
        accept: None,
    },
    RecognizerRule {
        kind: ExtractionKind::MarkdownTables,
        regex: &RE_MARKDOWN_TABLE,
        span_group: 0,
        value_group: 0,
        normalize: Normalize::Trim,
        accept: None,
    },
    RecognizerRule {
        kind: ExtractionKind::MarkdownCode,
        regex: &RE_MARKDOWN_CODE,
        span_group: 0,
        value_group: 1,
        normalize: Normalize::TrimTrailingNewline,
        accept: None,
    },
];

/// The rule for a kind.
pub fn rule(kind: ExtractionKind) -> &'static RecognizerRule {
    &RULES[kind.precedence()]
}

impl RecognizerRule {
    /// All matches of this rule in `text`, in source order, before any
    /// cross-kind precedence is applied.
    pub fn find(&self, text: &str) -> Vec<RawMatch> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| self.to_match(&caps))
            .collect()
    }

    fn to_match(&self, caps: &Captures<'_>) -> Option<RawMatch> {
        let span = caps.get(self.span_group)?;
        let raw = caps.get(self.value_group)?.as_str();

        let (value, end) = match self.normalize {
            Normalize::Verbatim => (raw, span.end()),
            Normalize::TrimUrl => {
                let trimmed = trim_url(raw);
                if !has_url_body(trimmed) {
                    return None;
                }
                (trimmed, span.start() + trimmed.len())
            }
            Normalize::StripSigil => (&raw[1..], span.end()),
            Normalize::Trim => (raw.trim(), span.end()),
            Normalize::TrimTrailingNewline => (raw.trim_end_matches(['\r', '\n']), span.end()),
        };

        if value.is_empty() {
            return None;
        }
        if let Some(accept) = self.accept {
            if !accept(value) {
                return None;
            }
        }

        Some(RawMatch {
            start: span.start(),
            end,
            value: value.to_string(),
        })
    }
}

fn trim_url(candidate: &str) -> &str {
    let mut s = candidate;

    while let Some(last) = s.chars().last() {
        let unbalanced = match last {
            ')' => s.matches('(').count() < s.matches(')').count(),
            _ => false,
        };
        if matches!(last, '.' | ',' | ';' | ':' | '!' | '?' | '*' | '~') || unbalanced {
            s = &s[..s.len() - last.len_utf8()];
        } else {
            break;
        }
    }

    s
}

/// Something must follow the scheme or `www.` prefix.
fn has_url_body(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    let body = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .or_else(|| lower.strip_prefix("www."))
        .unwrap_or(&lower);
    body.chars().any(char::is_alphanumeric)
}

fn is_image_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
