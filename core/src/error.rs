//! Error types for the HTTP/1.1 engine.
//!
//! # Design
//! Every failure is scoped to the single exchange in flight and returned to
//! the immediate caller; nothing is retried internally. `InvalidContentLength`
//! is the one lenient variant: it still carries the parsed `Response` (with an
//! empty body) so callers can inspect the status and headers that did arrive.

use std::io;

use thiserror::Error;

use crate::chunked::ChunkError;
use crate::response::Response;

/// Errors returned by the client, the resolver, and the response parser.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The URL has no scheme, no host, or an authority that cannot be parsed.
    #[error("invalid URL {url:?}: {reason}")]
    UrlParse { url: String, reason: String },

    /// DNS resolution, the TCP connect, or the TLS handshake failed.
    #[error("failed to connect to {authority}: {source}")]
    Connect {
        authority: String,
        #[source]
        source: io::Error,
    },

    /// Writing the request or reading the response head failed after the
    /// connection was established.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The first response line has fewer than two tokens or a non-numeric code.
    #[error("malformed status line: {0:?}")]
    MalformedStatusLine(String),

    /// `Content-Length` was present but not an integer. The response is still
    /// returned, with an empty body.
    #[error("invalid Content-Length header: {value:?}")]
    InvalidContentLength {
        value: String,
        response: Box<Response>,
    },

    /// The chunked body framing was broken.
    #[error("chunked body: {0}")]
    ChunkFormat(#[from] ChunkError),

    /// A 3xx response arrived without a usable `Location` header.
    #[error("redirect status {status} without a Location header")]
    MissingRedirectLocation { status: u16 },

    /// The redirect chain exceeded the configured hop limit.
    #[error("stopped after following {0} redirects")]
    TooManyRedirects(usize),

    #[error("header {0:?} has an empty value")]
    EmptyHeaderValue(String),

    #[error("header {0:?} is already present")]
    DuplicateHeader(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl HttpError {
    /// Recover the partially usable response carried by lenient errors.
    pub fn into_response(self) -> Option<Response> {
        match self {
            HttpError::InvalidContentLength { response, .. } => Some(*response),
            _ => None,
        }
    }

    pub(crate) fn url(url: &str, reason: impl Into<String>) -> Self {
        HttpError::UrlParse {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Unwrap a body read failure, surfacing chunk framing problems as
    /// `ChunkFormat` instead of a generic I/O error.
    pub(crate) fn from_body_read(err: io::Error) -> Self {
        match err.downcast::<ChunkError>() {
            Ok(chunk) => HttpError::ChunkFormat(chunk),
            Err(err) => HttpError::Io(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_read_error_surfaces_chunk_error() {
        let err = io::Error::new(io::ErrorKind::InvalidData, ChunkError::InvalidSize("zz".into()));
        let mapped = HttpError::from_body_read(err);
        assert!(matches!(mapped, HttpError::ChunkFormat(ChunkError::InvalidSize(ref s)) if s == "zz"));
    }

    #[test]
    fn plain_io_error_stays_io() {
        let err = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        assert!(matches!(HttpError::from_body_read(err), HttpError::Io(_)));
    }

    #[test]
    fn only_invalid_content_length_carries_a_response() {
        let err = HttpError::MissingRedirectLocation { status: 302 };
        assert!(err.into_response().is_none());
    }
}
