//! Response bodies and the policy that picks their framing.
//!
//! # Design
//! Framing is decided from two headers, `Transfer-Encoding` first:
//!
//! | Transfer-Encoding      | Content-Length | Body                       |
//! |------------------------|----------------|----------------------------|
//! | final coding `chunked` | ignored        | chunked decoder            |
//! | any other coding       | ignored        | read until the server closes |
//! | absent                 | integer        | capped at that many bytes  |
//! | absent                 | not an integer | error, empty body          |
//! | absent                 | absent         | empty                      |
//!
//! A `Body` is always readable, even when empty. It owns the remaining
//! stream (and thus the connection), which is closed when the body is
//! dropped or released.

use std::fmt;
use std::io::{self, BufRead, Read, Take};

use crate::chunked::ChunkedDecoder;
use crate::error::HttpError;
use crate::headers::{HeaderMap, CONTENT_LENGTH, TRANSFER_ENCODING};

/// The buffered connection stream left over after the response head.
pub type BodyStream = Box<dyn BufRead + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Empty,
    Length(u64),
    Chunked,
    UntilClose,
}

impl Framing {
    /// Pick the framing for a response. On an unparseable `Content-Length`
    /// the offending value is returned as the error.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, String> {
        if let Some(encoding) = headers.get(TRANSFER_ENCODING) {
            let last = encoding.rsplit(',').next().unwrap_or_default().trim();
            if last.eq_ignore_ascii_case("chunked") {
                return Ok(Framing::Chunked);
            }
            return Ok(Framing::UntilClose);
        }
        match headers.get(CONTENT_LENGTH) {
            None => Ok(Framing::Empty),
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Framing::Length)
                .map_err(|_| value.to_string()),
        }
    }
}

/// A readable response body.
pub struct Body {
    kind: Kind,
}

enum Kind {
    Empty,
    Length(Take<BodyStream>),
    Chunked(ChunkedDecoder<BodyStream>),
    UntilClose(BodyStream),
}

impl Body {
    pub fn empty() -> Self {
        Self { kind: Kind::Empty }
    }

    pub fn new(framing: Framing, stream: BodyStream) -> Self {
        let kind = match framing {
            Framing::Empty => Kind::Empty,
            Framing::Length(n) => Kind::Length(stream.take(n)),
            Framing::Chunked => Kind::Chunked(ChunkedDecoder::new(stream)),
            Framing::UntilClose => Kind::UntilClose(stream),
        };
        Self { kind }
    }

    pub fn framing(&self) -> Framing {
        match &self.kind {
            Kind::Empty => Framing::Empty,
            Kind::Length(take) => Framing::Length(take.limit()),
            Kind::Chunked(_) => Framing::Chunked,
            Kind::UntilClose(_) => Framing::UntilClose,
        }
    }

    /// Drain the rest of the body.
    pub fn read_all(&mut self) -> Result<Vec<u8>, HttpError> {
        let mut out = Vec::new();
        self.read_to_end(&mut out).map_err(HttpError::from_body_read)?;
        Ok(out)
    }

    /// Drain the rest of the body as text, replacing invalid UTF-8.
    pub fn text(&mut self) -> Result<String, HttpError> {
        let bytes = self.read_all()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Drop the body and close the connection without reading further.
    pub fn release(self) {}
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.kind {
            Kind::Empty => Ok(0),
            Kind::Length(take) => take.read(buf),
            Kind::Chunked(decoder) => decoder.read(buf),
            Kind::UntilClose(stream) => stream.read(buf),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body").field("framing", &self.framing()).finish()
    }
}
