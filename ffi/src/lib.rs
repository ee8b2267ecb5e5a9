//! C-ABI wrapper around `wirehttp-core`.
//!
//! # Overview
//! Exposes the four request verbs through `extern "C"` functions so any
//! language with a C FFI can issue HTTP/1.1 requests and stream response
//! bodies without linking against Rust types directly.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Requests are configured from the `WIREHTTP_*` environment variables;
//!   a bad value surfaces as `FfiErrorCode::Config`.
//! - A single `FfiHttpResult` envelope conveys the response handle and
//!   errors uniformly. The response handle keeps its connection open until
//!   the result is freed, so bodies can be read incrementally.
//! - The C caller owns all returned pointers and must call the matching
//!   `wirehttp_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::io::{ErrorKind, Read};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use wirehttp_core::{Client, ClientConfig, HeaderMap, HttpError, Method};

use types::*;

/// Borrow a C string as UTF-8. `None` for invalid UTF-8; callers check for null first.
fn borrow_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Header maps
// ---------------------------------------------------------------------------

/// Create an empty header map.
///
/// The caller must free the returned pointer with `wirehttp_headers_free`.
#[unsafe(no_mangle)]
pub extern "C" fn wirehttp_headers_new() -> *mut FfiHeaders {
    catch_unwind(|| {
        Box::into_raw(Box::new(FfiHeaders {
            inner: HeaderMap::new(),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Add a header. Fails with `Header` if `value` is empty or `name` is
/// already present.
#[unsafe(no_mangle)]
pub extern "C" fn wirehttp_headers_insert(
    headers: *mut FfiHeaders,
    name: *const c_char,
    value: *const c_char,
) -> FfiErrorCode {
    update_headers(headers, name, value, |map, name, value| map.insert(name, value))
}

/// Add or replace a header. Fails with `Header` if `value` is empty.
#[unsafe(no_mangle)]
pub extern "C" fn wirehttp_headers_set(
    headers: *mut FfiHeaders,
    name: *const c_char,
    value: *const c_char,
) -> FfiErrorCode {
    update_headers(headers, name, value, |map, name, value| map.set(name, value))
}

fn update_headers(
    headers: *mut FfiHeaders,
    name: *const c_char,
    value: *const c_char,
    apply: fn(&mut HeaderMap, &str, &str) -> Result<(), HttpError>,
) -> FfiErrorCode {
    catch_unwind(|| {
        if headers.is_null() || name.is_null() || value.is_null() {
            return FfiErrorCode::NullArg;
        }
        let (Some(name), Some(value)) = (borrow_str(name), borrow_str(value)) else {
            return FfiErrorCode::InvalidUtf8;
        };
        let headers = unsafe { &mut *headers };
        match apply(&mut headers.inner, name, value) {
            Ok(()) => FfiErrorCode::Ok,
            Err(e) => FfiErrorCode::from(&e),
        }
    })
    .unwrap_or(FfiErrorCode::Panic)
}

/// Free a header map. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn wirehttp_headers_free(headers: *mut FfiHeaders) {
    if !headers.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(headers) });
        });
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// `GET url`. `headers` may be null for no extra headers.
///
/// Never returns null. The caller must free the result with
/// `wirehttp_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn wirehttp_get(url: *const c_char, headers: *const FfiHeaders) -> *mut FfiHttpResult {
    perform(Method::Get, url, headers, None)
}

/// `POST url` with `body_len` bytes from `body`. `body` may be null only
/// when `body_len` is 0.
#[unsafe(no_mangle)]
pub extern "C" fn wirehttp_post(
    url: *const c_char,
    headers: *const FfiHeaders,
    body: *const u8,
    body_len: usize,
) -> *mut FfiHttpResult {
    perform(Method::Post, url, headers, Some((body, body_len)))
}

/// `PUT url` with `body_len` bytes from `body`.
#[unsafe(no_mangle)]
pub extern "C" fn wirehttp_put(
    url: *const c_char,
    headers: *const FfiHeaders,
    body: *const u8,
    body_len: usize,
) -> *mut FfiHttpResult {
    perform(Method::Put, url, headers, Some((body, body_len)))
}

/// `DELETE url`.
#[unsafe(no_mangle)]
pub extern "C" fn wirehttp_delete(url: *const c_char, headers: *const FfiHeaders) -> *mut FfiHttpResult {
    perform(Method::Delete, url, headers, None)
}

fn perform(
    method: Method,
    url: *const c_char,
    headers: *const FfiHeaders,
    body: Option<(*const u8, usize)>,
) -> *mut FfiHttpResult {
    catch_unwind(|| {
        if url.is_null() {
            return FfiHttpResult::null_arg("url");
        }
        let Some(url) = borrow_str(url) else {
            return FfiHttpResult::invalid_utf8("url");
        };
        let no_headers = HeaderMap::new();
        let headers = if headers.is_null() {
            &no_headers
        } else {
            unsafe { &(*headers).inner }
        };
        let body: Option<&[u8]> = match body {
            None => None,
            Some((ptr, 0)) if ptr.is_null() => Some(&[][..]),
            Some((ptr, _)) if ptr.is_null() => return FfiHttpResult::null_arg("body"),
            Some((ptr, len)) => Some(unsafe { std::slice::from_raw_parts(ptr, len) }),
        };

        let config = match ClientConfig::from_env() {
            Ok(config) => config,
            Err(e) => return FfiHttpResult::from_error(e),
        };
        match Client::new(config).request(method, url, headers, body) {
            Ok(response) => FfiHttpResult::from_response(response),
            Err(e) => FfiHttpResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiHttpResult::panic("panic during request"))
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// The status text after the protocol version, e.g. `"404 Not Found"`.
///
/// Returns null if `response` is null. Free with `wirehttp_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn wirehttp_response_status_line(response: *const FfiResponse) -> *mut c_char {
    catch_unwind(AssertUnwindSafe(|| {
        if response.is_null() {
            return std::ptr::null_mut();
        }
        let response = unsafe { &*response };
        into_c_string(&response.inner.status)
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Value of the response header `name` (case-sensitive), or null if absent.
///
/// Free a non-null return with `wirehttp_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn wirehttp_response_header(
    response: *const FfiResponse,
    name: *const c_char,
) -> *mut c_char {
    catch_unwind(AssertUnwindSafe(|| {
        if response.is_null() || name.is_null() {
            return std::ptr::null_mut();
        }
        let response = unsafe { &*response };
        borrow_str(name)
            .and_then(|name| response.inner.header(name))
            .map_or(std::ptr::null_mut(), into_c_string)
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Read up to `cap` body bytes into `buf`.
///
/// Returns the number of bytes written, 0 once the body is exhausted, or -1
/// on a null argument, a transport error, or broken chunk framing.
#[unsafe(no_mangle)]
pub extern "C" fn wirehttp_response_read_body(response: *mut FfiResponse, buf: *mut u8, cap: usize) -> i64 {
    catch_unwind(AssertUnwindSafe(|| {
        if response.is_null() || (buf.is_null() && cap > 0) {
            return -1;
        }
        if cap == 0 {
            return 0;
        }
        let response = unsafe { &mut *response };
        let out = unsafe { std::slice::from_raw_parts_mut(buf, cap) };
        loop {
            match response.inner.body.read(out) {
                Ok(n) => return n as i64,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => return -1,
            }
        }
    }))
    .unwrap_or(-1)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a result, its error message, and its response handle (closing the
/// connection). Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn wirehttp_free_result(result: *mut FfiHttpResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.response.is_null() {
            drop(unsafe { Box::from_raw(result.response) });
        }
    }));
}

/// Free a string returned by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn wirehttp_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Answer one request with `response` and hand back the raw request.
    fn serve_once(response: &'static [u8]) -> (CString, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/data", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            let head_end = loop {
                if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
                let n = socket.read(&mut buf).unwrap();
                assert!(n > 0);
                raw.extend_from_slice(&buf[..n]);
            };
            let body_len = String::from_utf8_lossy(&raw[..head_end])
                .lines()
                .find_map(|line| line.strip_prefix("Content-Length: ").map(|v| v.trim().parse::<usize>().unwrap()))
                .unwrap_or(0);
            while raw.len() < head_end + body_len {
                let n = socket.read(&mut buf).unwrap();
                assert!(n > 0);
                raw.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response).unwrap();
            String::from_utf8(raw).unwrap()
        });
        (CString::new(url).unwrap(), handle)
    }

    fn take_string(s: *mut c_char) -> String {
        assert!(!s.is_null());
        let text = unsafe { CStr::from_ptr(s) }.to_str().unwrap().to_string();
        wirehttp_free_string(s);
        text
    }

    #[test]
    fn headers_insert_rejects_duplicates_and_empty_values() {
        let headers = wirehttp_headers_new();
        let name = CString::new("Accept").unwrap();
        let value = CString::new("text/plain").unwrap();
        let empty = CString::new("").unwrap();

        assert_eq!(wirehttp_headers_insert(headers, name.as_ptr(), value.as_ptr()), FfiErrorCode::Ok);
        assert_eq!(wirehttp_headers_insert(headers, name.as_ptr(), value.as_ptr()), FfiErrorCode::Header);
        assert_eq!(wirehttp_headers_set(headers, name.as_ptr(), value.as_ptr()), FfiErrorCode::Ok);
        assert_eq!(wirehttp_headers_set(headers, name.as_ptr(), empty.as_ptr()), FfiErrorCode::Header);
        assert_eq!(unsafe { &*headers }.inner.get("Accept"), Some("text/plain"));

        wirehttp_headers_free(headers);
    }

    #[test]
    fn headers_null_args() {
        let name = CString::new("Accept").unwrap();
        assert_eq!(
            wirehttp_headers_insert(std::ptr::null_mut(), name.as_ptr(), name.as_ptr()),
            FfiErrorCode::NullArg
        );
        let headers = wirehttp_headers_new();
        assert_eq!(
            wirehttp_headers_insert(headers, name.as_ptr(), std::ptr::null()),
            FfiErrorCode::NullArg
        );
        wirehttp_headers_free(headers);
        wirehttp_headers_free(std::ptr::null_mut());
    }

    #[test]
    fn get_reads_status_headers_and_body() {
        let (url, server) = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 11\r\nX-Test: yes\r\n\r\nhello world");
        let headers = wirehttp_headers_new();
        let name = CString::new("X-Request").unwrap();
        let value = CString::new("from-c").unwrap();
        wirehttp_headers_insert(headers, name.as_ptr(), value.as_ptr());

        let result = wirehttp_get(url.as_ptr(), headers);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert!(r.error_message.is_null());
        assert_eq!(r.status_code, 200);

        assert_eq!(take_string(wirehttp_response_status_line(r.response)), "200 OK");
        let x_test = CString::new("X-Test").unwrap();
        assert_eq!(take_string(wirehttp_response_header(r.response, x_test.as_ptr())), "yes");
        let missing = CString::new("x-test").unwrap();
        assert!(wirehttp_response_header(r.response, missing.as_ptr()).is_null());

        let mut body = Vec::new();
        let mut buf = [0u8; 4];
        loop {
            let n = wirehttp_response_read_body(r.response, buf.as_mut_ptr(), buf.len());
            assert!(n >= 0);
            if n == 0 {
                break;
            }
            body.extend_from_slice(&buf[..n as usize]);
        }
        assert_eq!(body, b"hello world");

        wirehttp_free_result(result);
        wirehttp_headers_free(headers);

        let request = server.join().unwrap();
        assert!(request.starts_with("GET /data HTTP/1.1\r\n"));
        assert!(request.contains("X-Request: from-c\r\n"));
    }

    #[test]
    fn post_sends_body_with_content_length() {
        let (url, server) = serve_once(b"HTTP/1.1 201 Created\r\n\r\n");
        let body = b"payload";
        let result = wirehttp_post(url.as_ptr(), std::ptr::null(), body.as_ptr(), body.len());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.status_code, 201);
        wirehttp_free_result(result);

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /data HTTP/1.1\r\n"));
        assert!(request.contains("Content-Length: 7\r\n"));
    }

    #[test]
    fn invalid_content_length_keeps_the_response() {
        let (url, server) = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: nope\r\n\r\nbody");
        let result = wirehttp_delete(url.as_ptr(), std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::InvalidContentLength);
        assert!(!r.error_message.is_null());
        assert_eq!(r.status_code, 200);
        assert!(!r.response.is_null());

        let mut buf = [0u8; 8];
        assert_eq!(wirehttp_response_read_body(r.response, buf.as_mut_ptr(), buf.len()), 0);
        wirehttp_free_result(result);
        server.join().unwrap();
    }

    #[test]
    fn bad_url_reports_url_parse() {
        let url = CString::new("not a url").unwrap();
        let result = wirehttp_put(url.as_ptr(), std::ptr::null(), std::ptr::null(), 0);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::UrlParse);
        assert!(r.response.is_null());
        let message = unsafe { CStr::from_ptr(r.error_message) }.to_str().unwrap();
        assert!(message.contains("not a url"));
        wirehttp_free_result(result);
    }

    #[test]
    fn null_url_and_body_are_null_args() {
        let result = wirehttp_get(std::ptr::null(), std::ptr::null());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        wirehttp_free_result(result);

        let url = CString::new("http://127.0.0.1:1/").unwrap();
        let result = wirehttp_post(url.as_ptr(), std::ptr::null(), std::ptr::null(), 4);
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        wirehttp_free_result(result);
    }

    #[test]
    fn response_accessors_tolerate_null() {
        assert!(wirehttp_response_status_line(std::ptr::null()).is_null());
        assert!(wirehttp_response_header(std::ptr::null(), std::ptr::null()).is_null());
        assert_eq!(wirehttp_response_read_body(std::ptr::null_mut(), std::ptr::null_mut(), 0), -1);
    }

    #[test]
    fn free_null_is_safe() {
        wirehttp_free_result(std::ptr::null_mut());
        wirehttp_free_string(std::ptr::null_mut());
    }
}
