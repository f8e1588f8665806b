//! Logical read cursor of a stream.

use crate::error::{Result, StreamError};

/// Tracks the read cursor against the object's fixed length.
///
/// Seeks are lazy: only the cursor moves, the buffered chunk is left alone
/// until the next read decides whether it still covers the cursor.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PositionTracker {
    position: u64,
    content_length: u64,
}

impl PositionTracker {
    pub(crate) fn new(content_length: u64) -> Self {
        Self {
            position: 0,
            content_length,
        }
    }

    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    /// Move the cursor to `target`.
    ///
    /// Targets past the end are accepted; every read from there reports EOF.
    pub(crate) fn seek(&mut self, target: i64) -> Result<()> {
        if target < 0 {
            return Err(StreamError::invalid(format!(
                "cannot seek to negative offset {}",
                target
            )));
        }

        // Nothing to seek into
        if self.content_length == 0 {
            return Ok(());
        }

        self.position = target as u64;
        Ok(())
    }

    pub(crate) fn advance(&mut self, n: u64) {
        self.position += n;
    }

    pub(crate) fn remaining(&self) -> u64 {
        self.content_length.saturating_sub(self.position)
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.content_length == 0 || self.position >= self.content_length
    }

    /// Remaining bytes as a count that fits a signed 32-bit integer.
    pub(crate) fn available(&self) -> u32 {
        self.remaining().min(i32::MAX as u64) as u32
    }
}
