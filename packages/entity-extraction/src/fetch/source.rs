//! Page sources: where fetched HTML comes from.

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::redirect::Policy;
use tracing::debug;
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::fetch::guard::UrlGuard;
use crate::types::config::FetchOptions;

/// A successfully fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: Url,

    /// Content-Type header, if sent
    pub content_type: Option<String>,

    /// Body, possibly truncated to the configured cap
    pub body: String,
}

impl FetchedPage {
    /// Create an HTML page.
    pub fn html(final_url: Url, body: impl Into<String>) -> Self {
        Self {
            final_url,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: body.into(),
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Whether the body should be parsed for metadata.
    ///
    /// A missing Content-Type is given the benefit of the doubt.
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref().map_or(true, |ct| {
            let ct = ct.to_ascii_lowercase();
            ct.contains("text/html") || ct.contains("application/xhtml+xml")
        })
    }
}

/// Fetches one page per call. Implementations do no caching of their own.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch `url`. Non-success statuses are errors.
    async fn fetch(&self, url: &Url) -> FetchResult<FetchedPage>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// `reqwest`-backed page source.
pub struct HttpSource {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpSource {
    /// Build a client honoring the timeout, redirect limit, user agent and
    /// body cap from `options`. Redirect targets must pass the guard implied
    /// by `options.block_private_hosts`.
    pub fn new(options: &FetchOptions) -> FetchResult<Self> {
        Self::with_guard(options, UrlGuard::new(options.block_private_hosts))
    }

    /// Like [`new`](Self::new), checking every redirect hop against `guard`.
    pub fn with_guard(options: &FetchOptions, guard: UrlGuard) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .redirect(redirect_policy(options.max_redirects, guard))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            max_body_bytes: options.max_body_bytes,
        })
    }
}

fn redirect_policy(max_redirects: usize, guard: UrlGuard) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            return attempt.error(FetchError::Request("too many redirects".to_string()));
        }
        match guard.check(attempt.url().as_str()) {
            Ok(_) => attempt.follow(),
            Err(err) => {
                debug!(url = %attempt.url(), error = %err, "redirect refused");
                attempt.error(err)
            }
        }
    })
}

/// Decode a body using the `charset` of its Content-Type, UTF-8 otherwise.
/// A byte-order mark takes precedence over the declared charset.
fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_label)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self, url: &Url) -> FetchResult<FetchedPage> {
        debug!(url = %url, "HTTP fetch starting");
        let mut response = self
            .client
            .get(url.as_str())
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.5")
            .send()
            .await
            .map_err(|e| {
                debug!(url = %url, error = %e, "HTTP request failed");
                FetchError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "HTTP fetch returned non-success status");
            return Err(FetchError::Status(status.as_u16()));
        }

        // Capture final URL after redirects
        let final_url = response.url().clone();

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(FetchError::from)? {
            let remaining = self.max_body_bytes.saturating_sub(body.len());
            if chunk.len() >= remaining {
                body.extend_from_slice(&chunk[..remaining]);
                debug!(url = %url, limit = self.max_body_bytes, "body truncated");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url = %url, final_url = %final_url, bytes = body.len(), "HTTP fetch completed");

        let body = decode_body(&body, content_type.as_deref());
        Ok(FetchedPage {
            final_url,
            content_type,
            body,
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(content_type: Option<&str>) -> FetchedPage {
        FetchedPage {
            final_url: Url::parse("https://example.com/").unwrap(),
            content_type: content_type.map(String::from),
            body: String::new(),
        }
    }

    #[test]
    fn test_is_html() {
        assert!(page(Some("text/html; charset=utf-8")).is_html());
        assert!(page(Some("Application/XHTML+XML")).is_html());
        assert!(page(None).is_html());
        assert!(!page(Some("application/json")).is_html());
        assert!(!page(Some("image/png")).is_html());
    }

    #[test]
    fn test_charset_label() {
        assert_eq!(charset_label("text/html; charset=ISO-8859-1"), Some("ISO-8859-1"));
        assert_eq!(charset_label("text/html;charset=\"utf-8\""), Some("utf-8"));
        assert_eq!(charset_label("text/html"), None);
    }

    #[test]
    fn test_decode_body_honors_declared_charset() {
        let latin1 = b"Caf\xE9";
        assert_eq!(decode_body(latin1, Some("text/html; charset=iso-8859-1")), "Caf\u{e9}");
        assert_eq!(decode_body("Caf\u{e9}".as_bytes(), Some("text/html")), "Caf\u{e9}");
        assert_eq!(decode_body("Caf\u{e9}".as_bytes(), None), "Caf\u{e9}");
        assert_eq!(decode_body(b"abc", Some("text/html; charset=bogus")), "abc");
    }

    #[test]
    fn test_http_source_builds_from_options() {
        let source = HttpSource::new(&FetchOptions::default()).unwrap();
        assert_eq!(source.name(), "http");
    }
}
