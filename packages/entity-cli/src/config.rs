use anyhow::Result;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use entity_extraction::{CacheOptions, EnrichOptions, ExtractionError, FetchOptions};

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub fetch: FetchOptions,
    pub enrich: EnrichOptions,
    pub cache: CacheOptions,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let mut fetch = FetchOptions::default();
        if let Some(secs) = parse_var::<u64>("ENTITIES_TIMEOUT_SECS")? {
            fetch = fetch.with_timeout(Duration::from_secs(secs));
        }
        if let Ok(agent) = env::var("ENTITIES_USER_AGENT") {
            fetch = fetch.with_user_agent(agent);
        }
        if let Some(bytes) = parse_var("ENTITIES_MAX_BODY_BYTES")? {
            fetch = fetch.with_max_body_bytes(bytes);
        }
        if let Some(max) = parse_var("ENTITIES_MAX_REDIRECTS")? {
            fetch = fetch.with_max_redirects(max);
        }
        if let Some(block) = parse_var("ENTITIES_BLOCK_PRIVATE_HOSTS")? {
            fetch = fetch.with_block_private_hosts(block);
        }

        let mut enrich = EnrichOptions::default();
        if let Some(concurrency) = parse_var("ENTITIES_CONCURRENCY")? {
            enrich = enrich.with_concurrency(concurrency);
        }
        if let Some(secs) = parse_var::<u64>("ENTITIES_DEADLINE_SECS")? {
            enrich = enrich.with_deadline(Duration::from_secs(secs));
        }

        let mut cache = CacheOptions::default();
        if let Some(secs) = parse_var::<u64>("ENTITIES_CACHE_TTL_SECS")? {
            cache = cache.with_ttl(Duration::from_secs(secs));
        }

        Ok(Self {
            fetch,
            enrich,
            cache,
        })
    }
}

/// Parse an optional variable; unset or empty is `None`.
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => match raw.trim().parse() {
            Ok(value) => Ok(Some(value)),
            Err(err) => Err(ExtractionError::Config(format!(
                "{name} has an invalid value {raw:?}: {err}"
            ))
            .into()),
        },
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var() {
        env::set_var("ENTITIES_TEST_NUMBER", " 42 ");
        env::set_var("ENTITIES_TEST_BAD", "forty-two");
        env::set_var("ENTITIES_TEST_EMPTY", "");

        assert_eq!(parse_var::<u64>("ENTITIES_TEST_NUMBER").unwrap(), Some(42));
        let err = parse_var::<u64>("ENTITIES_TEST_BAD").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExtractionError>(),
            Some(ExtractionError::Config(msg)) if msg.starts_with("ENTITIES_TEST_BAD")
        ));
        assert_eq!(parse_var::<u64>("ENTITIES_TEST_EMPTY").unwrap(), None);
        assert_eq!(parse_var::<bool>("ENTITIES_TEST_UNSET").unwrap(), None);
    }
}
