//! URL resolution: scheme, authority, and request target for one exchange.
//!
//! # Design
//! Any scheme other than `http` is treated as TLS-secured. This is a
//! simplification, not scheme validation. The authority always carries an
//! explicit port: 80 for `http`, 443 for everything else when the URL names
//! none.

use std::fmt;

use url::Url;

use crate::error::HttpError;

pub const HTTP_PORT: u16 = 80;
pub const HTTPS_PORT: u16 = 443;

/// A URL broken down into what the connection and the request line need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: Url,
    pub scheme: String,
    /// Host as written in the URL; IPv6 literals keep their brackets.
    pub host: String,
    pub port: u16,
    /// Path plus `?query` when present. Never empty.
    pub path: String,
}

impl Target {
    pub fn parse(raw: &str) -> Result<Self, HttpError> {
        let url = Url::parse(raw).map_err(|e| HttpError::url(raw, e.to_string()))?;
        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(HttpError::url(raw, "missing host")),
        };
        let scheme = url.scheme().to_string();
        let default_port = if scheme == "http" { HTTP_PORT } else { HTTPS_PORT };
        // `Url::port` hides a written port equal to the scheme's registered
        // default (`ws://h:80`), which must still win over `default_port`.
        let port = match url.port() {
            Some(port) => port,
            None if has_explicit_port(raw) => url.port_or_known_default().unwrap_or(default_port),
            None => default_port,
        };

        let mut path = match url.path() {
            "" => "/".to_string(),
            p => p.to_string(),
        };
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }

        Ok(Self {
            url,
            scheme,
            host,
            port,
            path,
        })
    }

    /// `host:port`, used both to dial and as the `Host` header value.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_tls(&self) -> bool {
        self.scheme != "http"
    }

    /// Host name suitable for TLS server-name indication.
    pub fn server_name(&self) -> &str {
        self.host.trim_start_matches('[').trim_end_matches(']')
    }

    /// Resolve a `Location` value against this URL. Absolute locations are
    /// returned unchanged, relative ones are joined onto this target.
    pub fn resolve(&self, location: &str) -> Result<String, HttpError> {
        self.url
            .join(location)
            .map(String::from)
            .map_err(|e| HttpError::url(location, e.to_string()))
    }
}

/// Whether the authority of `raw` carries a `:port` suffix.
fn has_explicit_port(raw: &str) -> bool {
    let rest = raw.trim().split_once("://").map_or("", |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    let after_host = match host_port.rfind(']') {
        Some(end) => &host_port[end + 1..],
        None => host_port,
    };
    after_host.contains(':')
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_defaults_to_port_80() {
        let target = Target::parse("http://example.com/index.html").unwrap();
        assert_eq!(target.authority(), "example.com:80");
        assert_eq!(target.path, "/index.html");
        assert!(!target.is_tls());
    }

    #[test]
    fn https_defaults_to_port_443() {
        let target = Target::parse("https://example.com").unwrap();
        assert_eq!(target.authority(), "example.com:443");
        assert_eq!(target.path, "/");
        assert!(target.is_tls());
    }

    #[test]
    fn explicit_port_is_preserved() {
        let target = Target::parse("http://localhost:3000/items").unwrap();
        assert_eq!(target.port, 3000);
        assert_eq!(target.authority(), "localhost:3000");

        let target = Target::parse("https://localhost:8443/").unwrap();
        assert_eq!(target.authority(), "localhost:8443");
    }

    #[test]
    fn written_port_survives_even_when_it_is_a_scheme_default() {
        let target = Target::parse("ws://example.com:80/x").unwrap();
        assert_eq!(target.authority(), "example.com:80");
        assert!(target.is_tls());

        let target = Target::parse("ftp://example.com:21/").unwrap();
        assert_eq!(target.port, 21);

        let target = Target::parse("wss://example.com:443/").unwrap();
        assert_eq!(target.port, 443);

        let target = Target::parse("http://example.com:80/").unwrap();
        assert_eq!(target.port, HTTP_PORT);
    }

    #[test]
    fn explicit_port_detection() {
        assert!(has_explicit_port("ws://h:80/x"));
        assert!(has_explicit_port("https://u:p@[::1]:443/"));
        assert!(!has_explicit_port("https://u:p@host/path:1"));
        assert!(!has_explicit_port("https://[::1]/"));
        assert!(!has_explicit_port("http://h?q=a:b"));
    }

    #[test]
    fn unknown_scheme_is_treated_as_tls() {
        let target = Target::parse("gopher://example.com/x").unwrap();
        assert!(target.is_tls());
        assert_eq!(target.port, HTTPS_PORT);
        assert_eq!(target.path, "/x");
    }

    #[test]
    fn non_special_scheme_without_path_gets_root() {
        let target = Target::parse("gopher://example.com").unwrap();
        assert_eq!(target.path, "/");
    }

    #[test]
    fn query_is_kept_in_request_target() {
        let target = Target::parse("http://example.com/search?q=rust&page=2").unwrap();
        assert_eq!(target.path, "/search?q=rust&page=2");
    }

    #[test]
    fn missing_scheme_is_rejected() {
        let err = Target::parse("example.com/path").unwrap_err();
        assert!(matches!(err, HttpError::UrlParse { .. }));
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Target::parse("http://example.com:notaport/").unwrap_err();
        assert!(matches!(err, HttpError::UrlParse { .. }));
    }

    #[test]
    fn hostless_url_is_rejected() {
        let err = Target::parse("mailto:someone@example.com").unwrap_err();
        assert!(matches!(err, HttpError::UrlParse { ref reason, .. } if reason == "missing host"));
    }

    #[test]
    fn ipv6_server_name_drops_brackets() {
        let target = Target::parse("https://[::1]:8443/").unwrap();
        assert_eq!(target.authority(), "[::1]:8443");
        assert_eq!(target.server_name(), "::1");
    }

    #[test]
    fn resolve_relative_and_absolute_locations() {
        let target = Target::parse("http://example.com/a/b").unwrap();
        assert_eq!(target.resolve("/next").unwrap(), "http://example.com/next");
        assert_eq!(target.resolve("c").unwrap(), "http://example.com/a/c");
        assert_eq!(
            target.resolve("https://other.org/x").unwrap(),
            "https://other.org/x"
        );
    }
}
