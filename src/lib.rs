//! # objstream
//!
//! Buffered, seekable read streams over objects held in a remote store.
//!
//! An [`ObjectStream`] lets a consumer seek anywhere in one immutable object
//! and read any number of bytes, while the store is only ever asked for
//! readahead-sized byte ranges. Small reads that land inside the chunk that
//! is already held are served without another round trip.
//!
//! ## Features
//!
//! - Lazy seeks: moving the cursor never fetches by itself
//! - Forward and backward refetches when the cursor leaves the held chunk
//! - Reads spanning several chunks, fetched back to back
//! - Positioned `read_fully` that leaves the cursor untouched
//! - `std::io::Read` and `std::io::Seek` for generic consumers
//! - Stores for HTTP (Range requests), local directories and memory
//!
//! ## Example
//!
//! ```no_run
//! use std::io::Read;
//! use std::sync::Arc;
//! use objstream::{HttpObjectStore, ObjectStream, SeekableStream, StreamOptions};
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(HttpObjectStore::new("https://example.com/objects")?);
//!     let mut stream = ObjectStream::open(store, "bucket", "data.bin", StreamOptions::new())?;
//!
//!     stream.seek(1024)?;
//!     let mut header = [0u8; 16];
//!     stream.read_exact(&mut header)?;
//!
//!     stream.close();
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod stream;

pub use cli::Cli;
pub use config::{DEFAULT_READAHEAD, StreamOptions};
pub use error::{Result, StreamError};
pub use io::{Chunk, HttpObjectStore, LocalObjectStore, MemoryObjectStore, ObjectStore};
pub use stream::{FetchStats, ObjectStream, SeekableStream};
