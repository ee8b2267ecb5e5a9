//! Header store shared by outgoing requests and parsed responses.
//!
//! # Design
//! Names are compared case-sensitively, exactly as they travel on the wire;
//! no normalization happens on insert or lookup. Each name holds a single
//! value. Rendering order is unspecified because only a handful of headers
//! are ever inspected by name.

use std::collections::HashMap;

use crate::error::HttpError;

pub const HOST: &str = "Host";
pub const CONNECTION: &str = "Connection";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const TRANSFER_ENCODING: &str = "Transfer-Encoding";
pub const LOCATION: &str = "Location";

/// Mapping from header name to a single value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: HashMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `name` unless the name is already taken.
    ///
    /// Fails with `EmptyHeaderValue` for an empty value and with
    /// `DuplicateHeader` when `name` is present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<(), HttpError> {
        let name = name.into();
        let value = value.into();
        if value.is_empty() {
            return Err(HttpError::EmptyHeaderValue(name));
        }
        if self.entries.contains_key(&name) {
            return Err(HttpError::DuplicateHeader(name));
        }
        self.entries.insert(name, value);
        Ok(())
    }

    /// Store `value` under `name`, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<(), HttpError> {
        let name = name.into();
        let value = value.into();
        if value.is_empty() {
            return Err(HttpError::EmptyHeaderValue(name));
        }
        self.entries.insert(name, value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Lazily render each entry as a `name: value` line, without terminator.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.iter().map(|(name, value)| format!("{name}: {value}"))
    }
}
