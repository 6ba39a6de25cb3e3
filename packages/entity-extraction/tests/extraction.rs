//! Extraction through the public API.

use entity_extraction::{
    extract, extract_all, is_match, ExtractionError, ExtractionKind, RichText,
};

const POST: &str = "\
Release notes for 2024-03-01, thanks @alice and @bob!

Docs: https://docs.example.com/guide#install (mirror: www.example.org/guide).
Logo https://cdn.example.com/logo.svg, contact team@example.com or +44 20 7946 0958.

| Version | Date |
|---------|------|
| 1.2.0   | March 1, 2024 |

```sh
curl -fsSL https://get.example.com | sh # install
```

#release #changelog #release
";

#[test]
fn test_end_to_end_sample() {
    let text = RichText::new("Visit https://example.com and email foo@bar.com #ruby @alice");
    assert_eq!(text.links(), vec!["https://example.com"]);
    assert_eq!(text.emails(), vec!["foo@bar.com"]);
    assert_eq!(text.tags(), vec!["ruby"]);
    assert_eq!(text.mentions(), vec!["alice"]);
}

#[test]
fn test_mixed_document() {
    let report = extract_all(POST);

    assert_eq!(
        report.links,
        vec![
            "https://docs.example.com/guide#install",
            "www.example.org/guide",
            "https://cdn.example.com/logo.svg",
            "https://get.example.com",
        ]
    );
    assert_eq!(report.images, vec!["https://cdn.example.com/logo.svg"]);
    assert_eq!(report.mentions, vec!["alice", "bob"]);
    assert_eq!(report.emails, vec!["team@example.com"]);
    assert_eq!(report.phones, vec!["+44 20 7946 0958"]);
    assert_eq!(report.hashtags, vec!["release", "changelog"]);
    assert!(report.dates.contains(&"2024-03-01".to_string()));
    assert!(report.dates.contains(&"March 1, 2024".to_string()));
    assert_eq!(report.markdown_tables.len(), 1);
    assert_eq!(report.markdown_code.len(), 1);
    assert!(report.markdown_code[0].starts_with("curl -fsSL"));
}

#[test]
fn test_fragment_never_doubles_as_hashtag() {
    assert!(!extract(POST, ExtractionKind::Hashtags).contains(&"install".to_string()));
}

#[test]
fn test_kind_names_parse() {
    assert_eq!("links".parse::<ExtractionKind>(), Ok(ExtractionKind::Links));
    assert_eq!("markdown-code".parse::<ExtractionKind>(), Ok(ExtractionKind::MarkdownCode));
    assert_eq!(
        "rails".parse::<ExtractionKind>(),
        Err(ExtractionError::UnknownKind { name: "rails".to_string() })
    );
}

#[test]
fn test_validator_surface() {
    assert!(is_match("team@example.com", ExtractionKind::Emails));
    assert!(is_match("2024-03-01", ExtractionKind::Dates));
    assert!(!is_match("team@example.com, bob@example.com", ExtractionKind::Emails));
    assert!(!is_match("", ExtractionKind::Links));
}
