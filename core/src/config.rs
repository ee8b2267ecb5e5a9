//! Client configuration.
//!
//! # Design
//! Defaults match the plain blocking behaviour of the engine: no connect,
//! read, or write deadline, so calls may block indefinitely. Only the
//! redirect chain is capped. Timeouts are opt-in and applied to the TCP
//! socket underneath both plain and TLS connections.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HttpError;

pub const DEFAULT_MAX_REDIRECTS: usize = 10;

pub const ENV_MAX_REDIRECTS: &str = "WIREHTTP_MAX_REDIRECTS";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "WIREHTTP_CONNECT_TIMEOUT_MS";
pub const ENV_READ_TIMEOUT_MS: &str = "WIREHTTP_READ_TIMEOUT_MS";
pub const ENV_WRITE_TIMEOUT_MS: &str = "WIREHTTP_WRITE_TIMEOUT_MS";

/// Tunables for a `Client`. Timeouts are in milliseconds; `None` disables them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub max_redirects: usize,
    pub connect_timeout_ms: Option<u64>,
    pub read_timeout_ms: Option<u64>,
    pub write_timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
            connect_timeout_ms: None,
            read_timeout_ms: None,
            write_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by the `WIREHTTP_*` environment variables.
    pub fn from_env() -> Result<Self, HttpError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HttpError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(hops) = parse_var(&lookup, ENV_MAX_REDIRECTS)? {
            config.max_redirects = usize::try_from(hops)
                .map_err(|e| HttpError::Config(format!("{ENV_MAX_REDIRECTS}={hops}: {e}")))?;
        }
        if let Some(ms) = parse_var(&lookup, ENV_CONNECT_TIMEOUT_MS)? {
            config.connect_timeout_ms = Some(ms);
        }
        if let Some(ms) = parse_var(&lookup, ENV_READ_TIMEOUT_MS)? {
            config.read_timeout_ms = Some(ms);
        }
        if let Some(ms) = parse_var(&lookup, ENV_WRITE_TIMEOUT_MS)? {
            config.write_timeout_ms = Some(ms);
        }
        Ok(config)
    }

    /// Parse a JSON object; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, HttpError> {
        serde_json::from_str(json).map_err(|e| HttpError::Config(e.to_string()))
    }

    pub fn with_max_redirects(mut self, hops: usize) -> Self {
        self.max_redirects = hops;
        self
    }

    pub fn with_timeouts(mut self, connect: Option<Duration>, read: Option<Duration>) -> Self {
        self.connect_timeout_ms = connect.map(duration_ms);
        self.read_timeout_ms = read.map(duration_ms);
        self
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        timeout(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        timeout(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        timeout(self.write_timeout_ms)
    }
}

fn parse_var<F>(lookup: &F, key: &str) -> Result<Option<u64>, HttpError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| HttpError::Config(format!("{key}={raw:?}: {e}"))),
    }
}

// Zero would mean "no timeout" to the socket API, so it is treated as unset.
fn timeout(ms: Option<u64>) -> Option<Duration> {
    ms.filter(|ms| *ms > 0).map(Duration::from_millis)
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
