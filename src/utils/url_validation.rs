//! Validation for endpoint URLs taken from user-supplied material.
//!
//! Service-account uploads carry their own `token_uri`, and the gateway POSTs
//! a signed assertion to it. Checks here keep that request from being aimed
//! at internal addresses. Only the URL itself is inspected; no DNS lookups
//! happen on the upload path.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use thiserror::Error;
use tracing::warn;
use url::{Host, Url};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("not a valid URL: {0}")]
    InvalidFormat(#[from] url::ParseError),

    #[error("scheme '{0}' is not allowed, use https")]
    HttpsRequired(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("host {0} is an internal address")]
    PrivateIpDetected(IpAddr),

    #[error("host {0} is a local name")]
    LocalHostDetected(String),
}

/// Whether `ip` belongs to a range that is never a public token endpoint:
/// loopback, private, link-local, CGNAT, benchmarking, documentation,
/// multicast, reserved, unique-local, NAT64 or the unspecified network.
pub fn is_internal_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_internal_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(mapped) => is_internal_v4(&mapped),
            None => is_internal_v6(v6),
        },
    }
}

fn is_internal_v4(ip: &Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    a == 0
        || a >= 240
        || ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_documentation()
        || (a == 100 && (64..128).contains(&b))
        || (a == 198 && matches!(b, 18 | 19))
}

fn is_internal_v6(ip: &Ipv6Addr) -> bool {
    let segments = ip.segments();
    // 64:ff9b::/96 translates to the embedded IPv4 address
    if segments[..6] == [0x0064, 0xff9b, 0, 0, 0, 0] {
        let [.., a, b, c, d] = ip.octets();
        return is_internal_v4(&Ipv4Addr::new(a, b, c, d));
    }
    ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        || (segments[0] & 0xffc0) == 0xfe80
        || (segments[0] & 0xfe00) == 0xfc00
        || (segments[0] == 0x2001 && segments[1] == 0x0db8)
}

/// Lowercased host name without the trailing root dot, so `localhost.` and
/// `localhost` compare equal.
fn normalized_domain(domain: &str) -> String {
    domain.trim_end_matches('.').to_ascii_lowercase()
}

fn is_loopback_host(parsed: &Url) -> bool {
    match parsed.host() {
        Some(Host::Domain(domain)) => normalized_domain(domain) == "localhost",
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// Validate an outbound endpoint URL.
///
/// Requires HTTPS and a public host. With `allow_loopback`, plain-HTTP
/// loopback endpoints are accepted as well, which local development and the
/// mock servers in tests rely on.
pub fn validate_endpoint_url(url: &str, allow_loopback: bool) -> Result<Url, UrlValidationError> {
    let parsed = Url::parse(url)?;
    let secure = match parsed.scheme() {
        "https" => true,
        "http" => false,
        other => return Err(UrlValidationError::HttpsRequired(other.to_string())),
    };
    if parsed.host().is_none() {
        return Err(UrlValidationError::MissingHost);
    }
    if allow_loopback && is_loopback_host(&parsed) {
        return Ok(parsed);
    }
    if !secure {
        return Err(UrlValidationError::HttpsRequired("http".to_string()));
    }

    let ip = match parsed.host() {
        Some(Host::Ipv4(v4)) => Some(IpAddr::V4(v4)),
        Some(Host::Ipv6(v6)) => Some(IpAddr::V6(v6)),
        Some(Host::Domain(domain)) => {
            let domain = normalized_domain(domain);
            if domain == "localhost"
                || domain.ends_with(".localhost")
                || domain.ends_with(".internal")
            {
                warn!(host = %domain, "Rejected endpoint on a local host name");
                return Err(UrlValidationError::LocalHostDetected(domain));
            }
            None
        }
        None => return Err(UrlValidationError::MissingHost),
    };
    if let Some(ip) = ip.filter(is_internal_ip) {
        warn!(%ip, "Rejected endpoint on an internal address");
        return Err(UrlValidationError::PrivateIpDetected(ip));
    }
    Ok(parsed)
}
