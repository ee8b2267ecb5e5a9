//! HTTP/1.1 request construction and serialization.
//!
//! # Design
//! A `Request` is built fresh for every exchange (including each redirect
//! hop) from a copy of the caller's headers. `Host` and `Connection: close`
//! are always forced; `Content-Length` is forced to the exact body length
//! when a non-empty body is present. Bodies go out as one pre-sized blob,
//! never chunked.

use std::fmt;
use std::io::{self, Write};

use crate::error::HttpError;
use crate::headers::{HeaderMap, CONNECTION, CONTENT_LENGTH, HOST};
use crate::target::Target;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Authority including the port, as sent in `Host`.
    pub host: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(
        method: Method,
        target: &Target,
        mut headers: HeaderMap,
        body: Option<&[u8]>,
    ) -> Result<Self, HttpError> {
        let host = target.authority();
        apply_mandatory_headers(&mut headers, &host, body)?;
        Ok(Self {
            method,
            host,
            path: target.path.clone(),
            headers,
            body: body.map(<[u8]>::to_vec),
        })
    }

    /// Request line, header lines, blank line, then the body verbatim.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{} {} HTTP/1.1\r\n", self.method, self.path)?;
        for line in self.headers.lines() {
            write!(out, "{line}\r\n")?;
        }
        out.write_all(b"\r\n")?;
        if let Some(body) = &self.body {
            out.write_all(body)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut out);
        out
    }
}

/// Force `Host`, `Connection: close`, and (for a non-empty body)
/// `Content-Length`, overwriting whatever the caller set.
pub fn apply_mandatory_headers(
    headers: &mut HeaderMap,
    authority: &str,
    body: Option<&[u8]>,
) -> Result<(), HttpError> {
    headers.set(HOST, authority)?;
    headers.set(CONNECTION, "close")?;
    if let Some(body) = body.filter(|b| !b.is_empty()) {
        headers.set(CONTENT_LENGTH, body.len().to_string())?;
    }
    Ok(())
}
