//! Response head parsing.
//!
//! # Design
//! The head is read line by line; `\n` terminates a line and surrounding
//! whitespace (including the `\r`) is stripped. Parsing is deliberately
//! lenient past the status line:
//!
//! - header lines without a `": "` separator are skipped;
//! - a repeated header keeps its first value, later copies are ignored;
//! - end-of-stream before the blank line ends the head without error.
//!
//! The status line is the only strict part: it needs at least two tokens and
//! a numeric code.

use std::io::{self, BufRead};

use log::{debug, warn};

use crate::body::{Body, BodyStream, Framing};
use crate::error::HttpError;
use crate::headers::HeaderMap;

/// A parsed response. The body owns the connection until it is drained or
/// dropped.
#[derive(Debug)]
pub struct Response {
    pub status_code: u16,
    /// Code and reason phrase, e.g. `"200 OK"`.
    pub status: String,
    pub headers: HeaderMap,
    pub body: Body,
    /// `true` iff `status_code == 200`.
    pub ok: bool,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code)
    }

    fn from_head(head: ResponseHead, body: Body) -> Self {
        Self {
            ok: head.status_code == 200,
            status_code: head.status_code,
            status: head.status,
            headers: head.headers,
            body,
        }
    }
}

/// Status line and headers, before a body is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status_code: u16,
    pub status: String,
    pub headers: HeaderMap,
}

/// Read the head from `stream`, then attach the body chosen by its headers.
///
/// An unparseable `Content-Length` still yields the response, with an empty
/// body, inside `HttpError::InvalidContentLength`.
pub fn read_response(mut stream: BodyStream) -> Result<Response, HttpError> {
    let head = read_head(&mut stream)?;
    debug!("received {}", head.status);
    match Framing::from_headers(&head.headers) {
        Ok(framing) => Ok(Response::from_head(head, Body::new(framing, stream))),
        Err(value) => {
            warn!("ignoring body: Content-Length {value:?} is not a number");
            Err(HttpError::InvalidContentLength {
                value,
                response: Box::new(Response::from_head(head, Body::empty())),
            })
        }
    }
}

pub fn read_head<R: BufRead>(reader: &mut R) -> Result<ResponseHead, HttpError> {
    let status_line = read_line(reader)?.unwrap_or_default();
    let (status_code, status) = parse_status_line(&status_line)?;

    let mut headers = HeaderMap::new();
    while let Some(line) = read_line(reader)? {
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(": ") else {
            warn!("skipping header line without \": \" separator: {line:?}");
            continue;
        };
        if let Err(e) = headers.insert(name, value) {
            debug!("ignoring header line {line:?}: {e}");
        }
    }

    Ok(ResponseHead {
        status_code,
        status,
        headers,
    })
}

/// Split `HTTP/<version> <code> <reason...>` into the numeric code and the
/// `"<code> <reason>"` text, reason words rejoined with single spaces.
pub fn parse_status_line(line: &str) -> Result<(u16, String), HttpError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(HttpError::MalformedStatusLine(line.to_string()));
    }
    let code = tokens[1]
        .parse::<u16>()
        .map_err(|_| HttpError::MalformedStatusLine(line.to_string()))?;
    Ok((code, tokens[1..].join(" ")))
}

/// Read one line with surrounding whitespace stripped. `None` means the
/// stream was already at its end; a final line without `\n` is returned as-is.
pub(crate) fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut raw = Vec::new();
    if reader.read_until(b'\n', &mut raw)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&raw).trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn stream(wire: &str) -> BodyStream {
        Box::new(Cursor::new(wire.as_bytes().to_vec()))
    }

    #[test]
    fn status_line_ok() {
        let (code, status) = parse_status_line("HTTP/1.1 200 OK").unwrap();
        assert_eq!(code, 200);
        assert_eq!(status, "200 OK");
    }

    #[test]
    fn status_line_multi_word_reason_is_rejoined() {
        let (code, status) = parse_status_line("HTTP/1.1   301  Moved    Permanently").unwrap();
        assert_eq!(code, 301);
        assert_eq!(status, "301 Moved Permanently");
    }

    #[test]
    fn status_line_without_reason() {
        assert_eq!(parse_status_line("HTTP/1.1 204").unwrap(), (204, "204".to_string()));
    }

    #[test]
    fn status_line_rejects_non_numeric_code() {
        let err = parse_status_line("HTTP/1.1 OK 200").unwrap_err();
        assert!(matches!(err, HttpError::MalformedStatusLine(_)));
    }

    #[test]
    fn status_line_rejects_single_token() {
        assert!(matches!(
            parse_status_line("HTTP/1.1"),
            Err(HttpError::MalformedStatusLine(_))
        ));
    }

    #[test]
    fn empty_stream_is_malformed() {
        let err = read_head(&mut Cursor::new(Vec::new())).unwrap_err();
        assert!(matches!(err, HttpError::MalformedStatusLine(ref l) if l.is_empty()));
    }

    #[test]
    fn head_stops_at_blank_line() {
        let mut reader = Cursor::new(b"HTTP/1.1 200 OK\r\nServer: test\r\n\r\nX-Body: not a header\r\n".to_vec());
        let head = read_head(&mut reader).unwrap();
        assert_eq!(head.headers.len(), 1);
        assert_eq!(head.headers.get("Server"), Some("test"));

        let mut rest = String::new();
        reader.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "X-Body: not a header\r\n");
    }

    #[test]
    fn lines_without_separator_are_skipped() {
        let mut reader = Cursor::new(b"HTTP/1.1 200 OK\r\nbogus line\r\nNoSpace:value\r\nGood: yes\r\n\r\n".to_vec());
        let head = read_head(&mut reader).unwrap();
        assert_eq!(head.headers.len(), 1);
        assert_eq!(head.headers.get("Good"), Some("yes"));
    }

    #[test]
    fn duplicate_headers_keep_first_value() {
        let mut reader = Cursor::new(
            b"HTTP/1.1 200 OK\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\n\r\n".to_vec(),
        );
        let head = read_head(&mut reader).unwrap();
        assert_eq!(head.headers.get("Set-Cookie"), Some("a=1"));
    }

    #[test]
    fn value_keeps_later_separators() {
        let mut reader = Cursor::new(b"HTTP/1.1 200 OK\r\nX-Note: a: b\r\n\r\n".to_vec());
        let head = read_head(&mut reader).unwrap();
        assert_eq!(head.headers.get("X-Note"), Some("a: b"));
    }

    #[test]
    fn eof_before_blank_line_returns_partial_head() {
        let mut reader = Cursor::new(b"HTTP/1.0 404 Not Found\nServer: old\n".to_vec());
        let head = read_head(&mut reader).unwrap();
        assert_eq!(head.status_code, 404);
        assert_eq!(head.status, "404 Not Found");
        assert_eq!(head.headers.get("Server"), Some("old"));
    }

    #[test]
    fn read_response_with_content_length_ignores_trailing_bytes() {
        let mut response =
            read_response(stream("HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhelloEXTRA")).unwrap();
        assert!(response.ok);
        assert_eq!(response.body.read_all().unwrap(), b"hello");
    }

    #[test]
    fn read_response_without_framing_headers_has_empty_body() {
        let mut response = read_response(stream("HTTP/1.1 200 OK\r\n\r\nignored")).unwrap();
        assert!(response.body.read_all().unwrap().is_empty());
    }

    #[test]
    fn read_response_chunked() {
        let mut response = read_response(stream(
            "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n",
        ))
        .unwrap();
        assert_eq!(response.body.text().unwrap(), "Wikipedia");
    }

    #[test]
    fn read_response_invalid_content_length_degrades() {
        let err = read_response(stream("HTTP/1.1 201 Created\r\nContent-Length: lots\r\n\r\nabc")).unwrap_err();
        let HttpError::InvalidContentLength { ref value, .. } = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(value, "lots");

        let mut response = err.into_response().unwrap();
        assert_eq!(response.status_code, 201);
        assert!(!response.ok);
        assert!(response.body.read_all().unwrap().is_empty());
    }

    #[test]
    fn non_200_is_not_ok() {
        let response = read_response(stream("HTTP/1.1 204 No Content\r\n\r\n")).unwrap();
        assert!(!response.ok);
        assert!(!response.is_redirect());

        let response = read_response(stream("HTTP/1.1 302 Found\r\nLocation: /x\r\n\r\n")).unwrap();
        assert!(response.is_redirect());
        assert_eq!(response.header("Location"), Some("/x"));
    }
}
