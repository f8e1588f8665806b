//! Stream configuration.

use crate::error::{Result, StreamError};

/// Readahead used when none is configured, or after it is cleared.
pub const DEFAULT_READAHEAD: u64 = 64 * 1024;

/// Options applied when an [`ObjectStream`](crate::ObjectStream) is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    /// Bytes requested from the store per fetch.
    pub readahead: u64,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            readahead: DEFAULT_READAHEAD,
        }
    }
}

impl StreamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_readahead(mut self, readahead: u64) -> Self {
        self.readahead = readahead;
        self
    }
}

/// Resolve a caller-supplied readahead value.
///
/// `None` falls back to [`DEFAULT_READAHEAD`]; negative values are rejected.
pub fn resolve_readahead(value: Option<i64>) -> Result<u64> {
    match value {
        None => Ok(DEFAULT_READAHEAD),
        Some(v) if v < 0 => Err(StreamError::invalid(format!(
            "negative readahead value {}",
            v
        ))),
        Some(v) => Ok(v as u64),
    }
}
