//! Minimal synchronous HTTP/1.1 client over raw TCP and TLS streams.
//!
//! # Overview
//! Serializes requests and parses responses itself instead of delegating to
//! a higher-level HTTP library. One logical request opens exactly one
//! connection per hop and closes it when the response body is drained,
//! released, or dropped.
//!
//! # Design
//! - `target` turns a URL into scheme, authority and request target;
//!   `connection` opens the matching TCP or rustls byte stream.
//! - `request` forces the mandatory headers and serializes the request.
//! - `response` parses the status line and header block; `body` picks the
//!   body framing and `chunked` decodes chunked transfer coding.
//! - `client` runs one exchange and follows redirects in a bounded loop.
//! - No connection reuse, HTTP/2, compression, cookies, or streaming
//!   request bodies.

pub mod body;
pub mod chunked;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod headers;
pub mod request;
pub mod response;
pub mod target;

pub use body::{Body, Framing};
pub use chunked::{ChunkError, ChunkState, ChunkedDecoder};
pub use client::{delete, get, post, put, Client};
pub use config::ClientConfig;
pub use error::HttpError;
pub use headers::HeaderMap;
pub use request::{Method, Request};
pub use response::Response;
pub use target::Target;
