//! Decoder for `Transfer-Encoding: chunked` bodies.
//!
//! # Design
//! The decoder is an explicit state machine stepped by each `read` call:
//!
//! - `AwaitingSize`: read one line, drop any `;extension`, parse hex size.
//!   Zero moves to `Done` after discarding trailer lines up to the blank
//!   line; anything else moves to `Data`.
//! - `Data { remaining }`: serve at most `min(buf.len(), remaining)` bytes.
//!   Once `remaining` is zero the next call consumes the CRLF that closes
//!   the chunk and goes back to `AwaitingSize`.
//! - `Done`: every read returns `Ok(0)`.
//!
//! Framing failures are reported as `io::Error` wrapping a `ChunkError`.
//! Bytes handed out by earlier calls stay delivered.

use std::io::{self, BufRead, Read};

use thiserror::Error;

use crate::response::read_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    AwaitingSize,
    Data { remaining: u64 },
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("invalid chunk size line {0:?}")]
    InvalidSize(String),

    #[error("expected CRLF after chunk data, found {0:?}")]
    MissingTerminator(String),

    #[error("stream ended before the terminating zero-size chunk")]
    Truncated,
}

impl ChunkError {
    fn into_io(self) -> io::Error {
        let kind = match self {
            ChunkError::Truncated => io::ErrorKind::UnexpectedEof,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, self)
    }
}

/// Wraps the stream positioned right after the response head.
#[derive(Debug)]
pub struct ChunkedDecoder<R> {
    inner: R,
    state: ChunkState,
}

impl<R: BufRead> ChunkedDecoder<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            state: ChunkState::AwaitingSize,
        }
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn next_chunk(&mut self) -> io::Result<ChunkState> {
        let line = read_line(&mut self.inner)?.ok_or_else(|| ChunkError::Truncated.into_io())?;
        let size = parse_chunk_size(&line).map_err(ChunkError::into_io)?;
        if size > 0 {
            return Ok(ChunkState::Data { remaining: size });
        }
        // Trailer section: header lines up to a blank line, all discarded.
        // A server closing right after the zero chunk is tolerated.
        while let Some(trailer) = read_line(&mut self.inner)? {
            if trailer.is_empty() {
                break;
            }
        }
        Ok(ChunkState::Done)
    }

    fn finish_chunk(&mut self) -> io::Result<()> {
        match read_line(&mut self.inner)? {
            Some(line) if line.is_empty() => Ok(()),
            Some(line) => Err(ChunkError::MissingTerminator(line).into_io()),
            None => Err(ChunkError::Truncated.into_io()),
        }
    }
}

impl<R: BufRead> Read for ChunkedDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.state {
                ChunkState::Done => return Ok(0),
                ChunkState::AwaitingSize => self.state = self.next_chunk()?,
                ChunkState::Data { remaining: 0 } => {
                    self.finish_chunk()?;
                    self.state = ChunkState::AwaitingSize;
                }
                ChunkState::Data { remaining } => {
                    let available = self.inner.fill_buf()?;
                    if available.is_empty() {
                        return Err(ChunkError::Truncated.into_io());
                    }
                    let wanted = usize::try_from(remaining).unwrap_or(usize::MAX);
                    let n = buf.len().min(wanted).min(available.len());
                    buf[..n].copy_from_slice(&available[..n]);
                    self.inner.consume(n);
                    self.state = ChunkState::Data {
                        remaining: remaining - n as u64,
                    };
                    return Ok(n);
                }
            }
        }
    }
}

/// Parse a chunk-size line, ignoring any `;name=value` extensions.
pub fn parse_chunk_size(line: &str) -> Result<u64, ChunkError> {
    let digits = line.split(';').next().unwrap_or_default().trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ChunkError::InvalidSize(line.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|_| ChunkError::InvalidSize(line.to_string()))
}
