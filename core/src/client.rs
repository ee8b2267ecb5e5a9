//! Request orchestration: one exchange per connection, plus redirects.
//!
//! # Design
//! `Client` holds only its `ClientConfig` and carries no state between
//! calls, so independent calls never share anything. Each exchange opens a
//! fresh connection, writes the request, parses the head and hands the
//! connection to the response body.
//!
//! Redirects (any 3xx) are followed by a bounded loop: the same method and
//! body are replayed against the `Location` target, resolved relative to
//! the hop that produced it, with a fresh copy of the caller's headers. The
//! previous hop's response, and its connection, is dropped before the next
//! hop connects.

use std::io::{BufReader, Write};

use log::debug;

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::HttpError;
use crate::headers::{HeaderMap, LOCATION};
use crate::request::{Method, Request};
use crate::response::{read_response, Response};
use crate::target::Target;

/// Synchronous HTTP/1.1 client.
#[derive(Debug, Clone, Default)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn get(&self, url: &str, headers: &HeaderMap) -> Result<Response, HttpError> {
        self.request(Method::Get, url, headers, None)
    }

    pub fn post(&self, url: &str, headers: &HeaderMap, body: &[u8]) -> Result<Response, HttpError> {
        self.request(Method::Post, url, headers, Some(body))
    }

    pub fn put(&self, url: &str, headers: &HeaderMap, body: &[u8]) -> Result<Response, HttpError> {
        self.request(Method::Put, url, headers, Some(body))
    }

    pub fn delete(&self, url: &str, headers: &HeaderMap) -> Result<Response, HttpError> {
        self.request(Method::Delete, url, headers, None)
    }

    /// Perform `method` against `url`, following redirects up to
    /// `max_redirects` hops.
    pub fn request(
        &self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        body: Option<&[u8]>,
    ) -> Result<Response, HttpError> {
        let mut target = Target::parse(url)?;
        let mut hops = 0;
        loop {
            let response = match self.exchange(method, &target, headers, body) {
                Ok(response) => response,
                // The head of a redirect is usable even when its body framing is not.
                Err(HttpError::InvalidContentLength { response, .. }) if response.is_redirect() => *response,
                Err(e) => return Err(e),
            };
            if !response.is_redirect() {
                return Ok(response);
            }

            let location = match response.header(LOCATION) {
                Some(location) if !location.is_empty() => location.to_string(),
                _ => {
                    return Err(HttpError::MissingRedirectLocation {
                        status: response.status_code,
                    })
                }
            };
            if hops >= self.config.max_redirects {
                return Err(HttpError::TooManyRedirects(hops));
            }
            hops += 1;

            let next = Target::parse(&target.resolve(&location)?)?;
            debug!("{} {} -> {next} (hop {hops})", response.status, target);
            drop(response);
            target = next;
        }
    }

    /// One build, send, parse round-trip with no redirect handling.
    pub fn exchange(
        &self,
        method: Method,
        target: &Target,
        headers: &HeaderMap,
        body: Option<&[u8]>,
    ) -> Result<Response, HttpError> {
        let request = Request::new(method, target, headers.clone(), body)?;
        let mut connection = Connection::open(target, &self.config)?;
        debug!("{method} {target}");

        connection.write_all(&request.to_bytes())?;
        connection.flush()?;

        read_response(Box::new(BufReader::new(connection)))
    }
}

/// `GET url` with a default `Client`.
pub fn get(url: &str, headers: &HeaderMap) -> Result<Response, HttpError> {
    Client::default().get(url, headers)
}

/// `POST url` with a default `Client`.
pub fn post(url: &str, headers: &HeaderMap, body: &[u8]) -> Result<Response, HttpError> {
    Client::default().post(url, headers, body)
}

/// `PUT url` with a default `Client`.
pub fn put(url: &str, headers: &HeaderMap, body: &[u8]) -> Result<Response, HttpError> {
    Client::default().put(url, headers, body)
}

/// `DELETE url` with a default `Client`.
pub fn delete(url: &str, headers: &HeaderMap) -> Result<Response, HttpError> {
    Client::default().delete(url, headers)
}
