//! Buffered, seekable read streams over a single remote object.
//!
//! An [`ObjectStream`] keeps one chunk of the object in memory and serves
//! reads from it while the cursor stays inside the chunk's range. A read
//! outside that range, or one that runs past the chunk's end, fetches new
//! chunks of `readahead` bytes from the [`ObjectStore`](crate::ObjectStore).

mod buffer;
mod object;
mod position;

pub use object::{FetchStats, ObjectStream};

use crate::error::Result;

/// Seekable byte stream with configurable readahead.
///
/// Positions and readahead values are signed at this boundary so that
/// negative inputs can be rejected with [`StreamError::InvalidArgument`]
/// instead of wrapping.
///
/// [`StreamError::InvalidArgument`]: crate::StreamError::InvalidArgument
pub trait SeekableStream {
    /// Move the cursor to `target`. No data is fetched until the next read.
    fn seek(&self, target: i64) -> Result<()>;

    fn position(&self) -> Result<u64>;

    /// Read one byte, or `None` at end of object.
    fn read_byte(&self) -> Result<Option<u8>>;

    /// Read up to `length` bytes into `buf[offset..]`.
    ///
    /// Returns `Some(0)` when `length` is zero and `None` at end of object.
    fn read_into(&self, buf: &mut [u8], offset: usize, length: usize) -> Result<Option<usize>>;

    /// Read exactly `length` bytes starting at absolute `position` into
    /// `buf[offset..]`, leaving the cursor where it was.
    fn read_fully(&self, position: i64, buf: &mut [u8], offset: usize, length: usize)
    -> Result<()>;

    /// Bytes left before the end of the object, capped at `i32::MAX`.
    fn available(&self) -> Result<u32>;

    /// Close the stream. Calling this more than once is harmless.
    fn close(&self);

    /// Set the fetch size; `None` restores the default.
    fn set_readahead(&self, readahead: Option<i64>) -> Result<()>;

    fn readahead(&self) -> Result<u64>;

    fn supports_mark(&self) -> bool {
        false
    }

    /// Objects have a single source, so this always reports `false`.
    fn seek_to_new_source(&self, target: i64) -> Result<bool>;
}
