//! URL admission: what the fetcher is willing to request.

use std::collections::HashSet;
use std::net::IpAddr;

use ipnet::IpNet;
use url::{Host, Url};

use crate::error::{FetchError, FetchResult};

const PRIVATE_HOSTS: [&str; 4] = [
    "localhost",
    "metadata.google.internal",
    "metadata.gke.internal",
    "instance-data",
];

const PRIVATE_CIDRS: [&str; 9] = [
    "10.0.0.0/8",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "169.254.0.0/16", // link-local, cloud metadata
    "127.0.0.0/8",
    "0.0.0.0/8",
    "::1/128",
    "fc00::/7",
    "fe80::/10",
];

/// Decides whether a link may be fetched.
///
/// Always requires an absolute `http`/`https` URL with a host. With
/// private-host blocking on, loopback, private, link-local and
/// cloud-metadata destinations are refused as well.
#[derive(Debug, Clone)]
pub struct UrlGuard {
    block_private: bool,
    blocked_hosts: HashSet<String>,
    blocked_cidrs: Vec<IpNet>,
}

impl UrlGuard {
    /// Syntax checks only.
    pub fn permissive() -> Self {
        Self {
            block_private: false,
            blocked_hosts: HashSet::new(),
            blocked_cidrs: Vec::new(),
        }
    }

    /// Syntax checks plus private-destination blocking.
    pub fn blocking_private() -> Self {
        Self {
            block_private: true,
            blocked_hosts: PRIVATE_HOSTS.into_iter().map(String::from).collect(),
            blocked_cidrs: PRIVATE_CIDRS
                .into_iter()
                .filter_map(|cidr| cidr.parse().ok())
                .collect(),
        }
    }

    pub fn new(block_private: bool) -> Self {
        if block_private {
            Self::blocking_private()
        } else {
            Self::permissive()
        }
    }

    /// Block an additional host name.
    pub fn block_host(mut self, host: impl Into<String>) -> Self {
        self.blocked_hosts.insert(host.into().to_ascii_lowercase());
        self
    }

    /// Block an additional CIDR range.
    pub fn block_cidr(mut self, cidr: IpNet) -> Self {
        self.blocked_cidrs.push(cidr);
        self
    }

    /// Parse and admit `url`.
    pub fn check(&self, url: &str) -> FetchResult<Url> {
        let parsed = Url::parse(url.trim()).map_err(|_| FetchError::InvalidUrl)?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl);
        }

        let ip = match parsed.host() {
            None => return Err(FetchError::InvalidUrl),
            Some(Host::Domain(domain)) => {
                let domain = domain.trim_end_matches('.');
                if domain.is_empty() {
                    return Err(FetchError::InvalidUrl);
                }
                if self.is_blocked_name(domain) {
                    return Err(FetchError::BlockedHost(domain.to_string()));
                }
                None
            }
            Some(Host::Ipv4(ip)) => Some(IpAddr::V4(ip)),
            Some(Host::Ipv6(ip)) => Some(IpAddr::V6(ip)),
        };

        if let Some(ip) = ip {
            if self.is_blocked_ip(&ip) {
                return Err(FetchError::BlockedHost(ip.to_string()));
            }
        }

        Ok(parsed)
    }

    /// Resolve a domain host and refuse it if any address falls in a
    /// blocked range. IP hosts were already covered by [`check`](Self::check).
    ///
    /// A name that does not resolve passes; the fetch itself will fail.
    pub async fn check_resolved(&self, url: &Url) -> FetchResult<()> {
        if self.blocked_cidrs.is_empty() {
            return Ok(());
        }
        let Some(Host::Domain(domain)) = url.host() else {
            return Ok(());
        };
        let port = url.port_or_known_default().unwrap_or(80);

        let Ok(addrs) = tokio::net::lookup_host((domain, port)).await else {
            return Ok(());
        };
        for addr in addrs {
            let ip = addr.ip();
            if self.is_blocked_ip(&ip) {
                return Err(FetchError::BlockedHost(format!("{domain} resolved to {ip}")));
            }
        }
        Ok(())
    }

    fn is_blocked_ip(&self, ip: &IpAddr) -> bool {
        self.blocked_cidrs.iter().any(|cidr| cidr.contains(ip))
    }

    fn is_blocked_name(&self, domain: &str) -> bool {
        self.blocked_hosts.contains(domain)
            || (self.block_private && domain.ends_with(".localhost"))
    }
}

impl Default for UrlGuard {
    fn default() -> Self {
        Self::permissive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_absolute_http_url() {
        let guard = UrlGuard::permissive();
        assert!(guard.check("https://example.com/a").is_ok());
        assert!(guard.check("  http://example.com  ").is_ok());
        assert_eq!(guard.check("not a url"), Err(FetchError::InvalidUrl));
        assert_eq!(guard.check("www.example.com"), Err(FetchError::InvalidUrl));
        assert_eq!(guard.check("ftp://example.com/file"), Err(FetchError::InvalidUrl));
        assert_eq!(guard.check("mailto:foo@bar.com"), Err(FetchError::InvalidUrl));
        assert_eq!(guard.check(""), Err(FetchError::InvalidUrl));
    }

    #[test]
    fn test_permissive_allows_private_hosts() {
        let guard = UrlGuard::permissive();
        assert!(guard.check("http://localhost:8080/").is_ok());
        assert!(guard.check("http://127.0.0.1/").is_ok());
    }

    #[test]
    fn test_blocks_private_destinations() {
        let guard = UrlGuard::blocking_private();
        for url in [
            "http://localhost/",
            "http://app.localhost/",
            "http://127.0.0.1:3000/",
            "http://10.1.2.3/",
            "http://192.168.1.1/",
            "http://169.254.169.254/latest/meta-data",
            "http://[::1]/",
            "http://metadata.google.internal/",
        ] {
            assert!(
                matches!(guard.check(url), Err(FetchError::BlockedHost(_))),
                "{url} should be blocked"
            );
        }
        assert!(guard.check("https://example.com/").is_ok());
        assert!(guard.check("http://8.8.8.8/").is_ok());
    }

    #[test]
    fn test_custom_blocks() {
        let guard = UrlGuard::permissive()
            .block_host("Internal.Example.com")
            .block_cidr("203.0.113.0/24".parse().unwrap());
        assert!(guard.check("https://internal.example.com/").is_err());
        assert!(guard.check("http://203.0.113.7/").is_err());
        assert!(guard.check("https://example.com/").is_ok());
    }

    #[tokio::test]
    async fn test_resolved_addresses_are_checked() {
        let guard = UrlGuard::permissive()
            .block_cidr("127.0.0.0/8".parse().unwrap())
            .block_cidr("::1/128".parse().unwrap());
        let url = Url::parse("http://localhost:8080/").unwrap();

        assert!(guard.check(url.as_str()).is_ok());
        assert!(matches!(
            guard.check_resolved(&url).await,
            Err(FetchError::BlockedHost(_))
        ));
    }

    #[tokio::test]
    async fn test_resolution_skipped_without_ranges() {
        let url = Url::parse("http://localhost/").unwrap();
        assert!(UrlGuard::permissive().check_resolved(&url).await.is_ok());
    }
}
