//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Headers and responses stay Rust-owned behind opaque handles; C only ever
//! sees pointers to them. Everything C reads directly (`FfiHttpResult`,
//! `FfiErrorCode`) has a C-compatible layout. Conversion functions live here
//! to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use wirehttp_core::{HeaderMap, HttpError, Response};

/// Opaque handle to a header map. Created by `wirehttp_headers_new`.
pub struct FfiHeaders {
    pub(crate) inner: HeaderMap,
}

/// Opaque handle to a response whose body is still attached to its
/// connection. Owned by the `FfiHttpResult` that carries it.
pub struct FfiResponse {
    pub(crate) inner: Response,
}

/// Error codes returned in `FfiHttpResult` and by the header functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    UrlParse = 1,
    Connection = 2,
    Io = 3,
    MalformedStatusLine = 4,
    /// The response handle is still set, with an empty body.
    InvalidContentLength = 5,
    ChunkFormat = 6,
    MissingRedirectLocation = 7,
    TooManyRedirects = 8,
    /// Empty header value or duplicate header name.
    Header = 9,
    Config = 10,
    Panic = 11,
    NullArg = 12,
    InvalidUtf8 = 13,
}

impl From<&HttpError> for FfiErrorCode {
    fn from(err: &HttpError) -> Self {
        match err {
            HttpError::UrlParse { .. } => FfiErrorCode::UrlParse,
            HttpError::Connect { .. } => FfiErrorCode::Connection,
            HttpError::Io(_) => FfiErrorCode::Io,
            HttpError::MalformedStatusLine(_) => FfiErrorCode::MalformedStatusLine,
            HttpError::InvalidContentLength { .. } => FfiErrorCode::InvalidContentLength,
            HttpError::ChunkFormat(_) => FfiErrorCode::ChunkFormat,
            HttpError::MissingRedirectLocation { .. } => FfiErrorCode::MissingRedirectLocation,
            HttpError::TooManyRedirects(_) => FfiErrorCode::TooManyRedirects,
            HttpError::EmptyHeaderValue(_) | HttpError::DuplicateHeader(_) => FfiErrorCode::Header,
            HttpError::Config(_) => FfiErrorCode::Config,
        }
    }
}

/// Result envelope for every request function.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `response`
/// points to the final (post-redirect) response. On failure `error_code`
/// describes the category and `error_message` is a human-readable C string;
/// `response` is null except for `InvalidContentLength`.
///
/// Free with `wirehttp_free_result`, which also closes the response's
/// connection.
#[repr(C)]
pub struct FfiHttpResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub status_code: u16,
    pub response: *mut FfiResponse,
}

impl FfiHttpResult {
    pub(crate) fn from_response(response: Response) -> *mut Self {
        Self::boxed(FfiErrorCode::Ok, None, Some(response))
    }

    pub(crate) fn from_error(err: HttpError) -> *mut Self {
        let code = FfiErrorCode::from(&err);
        let message = err.to_string();
        Self::boxed(code, Some(&message), err.into_response())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::NullArg, Some(&format!("null argument: {name}")), None)
    }

    pub(crate) fn invalid_utf8(name: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::InvalidUtf8, Some(&format!("{name} is not valid UTF-8")), None)
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, Some(msg), None)
    }

    fn boxed(error_code: FfiErrorCode, message: Option<&str>, response: Option<Response>) -> *mut Self {
        let status_code = response.as_ref().map_or(0, |r| r.status_code);
        let result = Box::new(FfiHttpResult {
            error_code,
            error_message: message.map_or(std::ptr::null_mut(), into_c_string),
            status_code,
            response: response.map_or(std::ptr::null_mut(), |inner| {
                Box::into_raw(Box::new(FfiResponse { inner }))
            }),
        });
        Box::into_raw(result)
    }
}

/// Hand a Rust string to C. Interior NULs are dropped rather than failing.
pub(crate) fn into_c_string(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}
