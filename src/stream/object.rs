use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::SeekableStream;
use super::buffer::{Lookup, RangeBuffer};
use super::position::PositionTracker;
use crate::config::{StreamOptions, resolve_readahead};
use crate::error::{Result, StreamError};
use crate::io::{Chunk, ObjectStore};

/// Counters for the fetches a stream has issued, the priming fetch included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub fetches: u64,
    pub bytes_fetched: u64,
}

/// Everything a read or seek mutates, guarded by one lock.
#[derive(Debug)]
struct State {
    cursor: PositionTracker,
    buffer: RangeBuffer,
    readahead: u64,
    stats: FetchStats,
}

/// Buffered, seekable read stream over one object of an [`ObjectStore`].
///
/// All operations serialise on an internal mutex, and fetches run while it
/// is held: a slow store blocks every other caller of the same stream.
/// Readers that want parallelism should open one stream each.
///
/// The `closed` flag can be read without the lock, but only flips while the
/// lock is held, so a close cannot slip in between a read's check and its
/// fetch.
pub struct ObjectStream<S: ObjectStore + ?Sized = dyn ObjectStore> {
    store: Arc<S>,
    container: String,
    key: String,
    uri: String,
    content_length: u64,
    closed: AtomicBool,
    state: Mutex<State>,
}

fn validate_names(container: &str, key: &str) -> Result<()> {
    if container.is_empty() {
        return Err(StreamError::invalid("empty container"));
    }
    if key.is_empty() {
        return Err(StreamError::invalid("empty key"));
    }
    Ok(())
}

/// `buf[offset..offset + length]`, or an error if that runs off the buffer
fn window(buf: &mut [u8], offset: usize, length: usize) -> Result<&mut [u8]> {
    let buf_len = buf.len();
    let end = offset
        .checked_add(length)
        .filter(|&end| end <= buf_len)
        .ok_or_else(|| {
            StreamError::invalid(format!(
                "range of {} bytes at offset {} exceeds buffer of {} bytes",
                length, offset, buf_len
            ))
        })?;
    Ok(&mut buf[offset..end])
}

impl<S: ObjectStore + ?Sized> ObjectStream<S> {
    /// Create a stream over `container/key`, whose length the caller already
    /// knows.
    ///
    /// The first `readahead` bytes are fetched before this returns. An empty
    /// object still gets this fetch, so a missing one fails here.
    pub fn new(
        store: Arc<S>,
        container: impl Into<String>,
        key: impl Into<String>,
        content_length: u64,
        options: StreamOptions,
    ) -> Result<Self> {
        let container = container.into();
        let key = key.into();
        validate_names(&container, &key)?;

        let uri = store.object_uri(&container, &key);
        log::trace!(
            "opening {}: content_length={}, readahead={}",
            uri,
            content_length,
            options.readahead
        );

        let stream = Self {
            store,
            container,
            key,
            uri,
            content_length,
            closed: AtomicBool::new(false),
            state: Mutex::new(State {
                cursor: PositionTracker::new(content_length),
                buffer: RangeBuffer::empty(),
                readahead: options.readahead,
                stats: FetchStats::default(),
            }),
        };

        {
            let mut state = stream.lock();
            stream.refill(&mut state, 0)?;
        }

        Ok(stream)
    }

    /// Look up the size of `container/key` in the store, then open it.
    pub fn open(
        store: Arc<S>,
        container: impl Into<String>,
        key: impl Into<String>,
        options: StreamOptions,
    ) -> Result<Self> {
        let container = container.into();
        let key = key.into();
        validate_names(&container, &key)?;

        let size = store
            .object_size(&container, &key)
            .map_err(|e| StreamError::Transport {
                uri: store.object_uri(&container, &key),
                offset: 0,
                source: e.into(),
            })?
            .ok_or_else(|| StreamError::ObjectUnavailable {
                uri: store.object_uri(&container, &key),
                offset: 0,
            })?;

        Self::new(store, container, key, size, options)
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> FetchStats {
        self.lock().stats
    }

    /// Absolute range `[start, finish)` of the chunk currently held.
    pub fn buffered_range(&self) -> Result<Range<u64>> {
        let state = self.lock_open()?;
        Ok(state.buffer.start()..state.buffer.finish())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(StreamError::Closed {
                uri: self.uri.clone(),
            });
        }
        Ok(())
    }

    fn lock_open(&self) -> Result<MutexGuard<'_, State>> {
        self.check_open()?;
        let state = self.lock();
        // close() may have won the race for the lock
        self.check_open()?;
        Ok(state)
    }

    fn fetch(&self, state: &mut State, offset: u64) -> Result<Chunk> {
        let len = state.readahead.max(1);

        let mut chunk = self
            .store
            .fetch_range(&self.container, &self.key, offset, len)
            .map_err(|e| StreamError::Transport {
                uri: self.uri.clone(),
                offset,
                source: e.into(),
            })?
            .ok_or_else(|| StreamError::ObjectUnavailable {
                uri: self.uri.clone(),
                offset,
            })?;

        if chunk.size() > len {
            chunk.truncate(len as usize);
        }
        state.stats.fetches += 1;
        state.stats.bytes_fetched += chunk.size();
        log::debug!(
            "fetched {}: offset={}, readahead={}, size={}",
            self.uri,
            offset,
            len,
            chunk.size()
        );

        // The object is shorter than the length it was opened with
        if chunk.is_empty() && offset < self.content_length {
            return Err(StreamError::UnexpectedEof {
                uri: self.uri.clone(),
                offset,
                missing: self.content_length - offset,
            });
        }

        Ok(chunk)
    }

    fn refill(&self, state: &mut State, offset: u64) -> Result<()> {
        let chunk = self.fetch(state, offset)?;
        state.buffer.replace(offset, chunk);
        log::debug!(
            "{}: buffered range [{}, {})",
            self.uri,
            state.buffer.start(),
            state.buffer.finish()
        );
        Ok(())
    }

    /// Make sure the held chunk covers the cursor and return the cursor's
    /// offset inside it.
    fn chunk_offset(&self, state: &mut State) -> Result<usize> {
        let position = state.cursor.position();
        match state.buffer.locate(position) {
            Lookup::Hit(offset) => Ok(offset),
            Lookup::ForwardMiss => {
                log::debug!("{}: reading next chunk at {}", self.uri, position);
                self.refill(state, position)?;
                Ok(0)
            }
            Lookup::BackwardMiss => {
                log::debug!("{}: reading previous chunk at {}", self.uri, position);
                self.refill(state, position)?;
                Ok(0)
            }
        }
    }

    fn read_byte_locked(&self, state: &mut State) -> Result<Option<u8>> {
        if state.cursor.is_eof() {
            return Ok(None);
        }

        let offset = self.chunk_offset(state)?;
        let byte = state.buffer.bytes_from(offset)[0];
        state.cursor.advance(1);
        Ok(Some(byte))
    }

    fn read_locked(&self, state: &mut State, buf: &mut [u8]) -> Result<Option<usize>> {
        if buf.is_empty() {
            return Ok(Some(0));
        }
        if state.cursor.is_eof() {
            return Ok(None);
        }

        let to_read = state.cursor.remaining().min(buf.len() as u64) as usize;

        let offset = self.chunk_offset(state)?;
        let held = state.buffer.bytes_from(offset);
        let mut copied = held.len().min(to_read);
        buf[..copied].copy_from_slice(&held[..copied]);

        // Continue from the end of each chunk until the request is met
        while copied < to_read {
            let next = state.buffer.finish();
            self.refill(state, next)?;
            let held = state.buffer.bytes_from(0);
            let n = held.len().min(to_read - copied);
            buf[copied..copied + n].copy_from_slice(&held[..n]);
            copied += n;
        }

        state.cursor.advance(to_read as u64);
        log::trace!(
            "{}: read {} bytes, position {}",
            self.uri,
            to_read,
            state.cursor.position()
        );
        Ok(Some(to_read))
    }

    fn read_fully_locked(&self, state: &mut State, position: i64, buf: &mut [u8]) -> Result<()> {
        state.cursor.seek(position)?;

        let mut nread = 0;
        while nread < buf.len() {
            match self.read_locked(state, &mut buf[nread..])? {
                Some(n) => nread += n,
                None => {
                    return Err(StreamError::UnexpectedEof {
                        uri: self.uri.clone(),
                        offset: state.cursor.position(),
                        missing: (buf.len() - nread) as u64,
                    });
                }
            }
        }
        Ok(())
    }

    /// Seek without surfacing errors, for cleanup paths
    fn seek_quietly(&self, state: &mut State, target: u64) {
        let result = i64::try_from(target)
            .map_err(|_| StreamError::invalid(format!("offset {} out of range", target)))
            .and_then(|target| state.cursor.seek(target));
        if let Err(e) = result {
            log::debug!("ignoring error on seek of {} to {}: {}", self.uri, target, e);
        }
    }
}

impl<S: ObjectStore + ?Sized> SeekableStream for ObjectStream<S> {
    fn seek(&self, target: i64) -> Result<()> {
        log::trace!("{}: seek to {}", self.uri, target);
        let mut state = self.lock_open()?;
        state.cursor.seek(target)
    }

    fn position(&self) -> Result<u64> {
        let state = self.lock_open()?;
        Ok(state.cursor.position())
    }

    fn read_byte(&self) -> Result<Option<u8>> {
        log::trace!("{}: read byte", self.uri);
        let mut state = self.lock_open()?;
        self.read_byte_locked(&mut state)
    }

    fn read_into(&self, buf: &mut [u8], offset: usize, length: usize) -> Result<Option<usize>> {
        log::trace!("{}: read {} bytes into offset {}", self.uri, length, offset);
        let mut state = self.lock_open()?;
        let target = window(buf, offset, length)?;
        self.read_locked(&mut state, target)
    }

    fn read_fully(
        &self,
        position: i64,
        buf: &mut [u8],
        offset: usize,
        length: usize,
    ) -> Result<()> {
        log::trace!(
            "{}: read fully {} bytes at {} into offset {}",
            self.uri,
            length,
            position,
            offset
        );
        let mut state = self.lock_open()?;
        let target = window(buf, offset, length)?;

        let saved = state.cursor.position();
        let result = self.read_fully_locked(&mut state, position, target);
        self.seek_quietly(&mut state, saved);
        result
    }

    fn available(&self) -> Result<u32> {
        let state = self.lock_open()?;
        Ok(state.cursor.available())
    }

    fn close(&self) {
        log::trace!("{}: close", self.uri);
        let mut state = self.lock();
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        state.buffer.clear();
        if let Err(e) = self.store.release(&self.container, &self.key) {
            log::debug!("ignoring error on close of {}: {:#}", self.uri, e);
        }
    }

    fn set_readahead(&self, readahead: Option<i64>) -> Result<()> {
        log::trace!("{}: set readahead {:?}", self.uri, readahead);
        let mut state = self.lock_open()?;
        state.readahead = resolve_readahead(readahead)?;
        Ok(())
    }

    fn readahead(&self) -> Result<u64> {
        let state = self.lock_open()?;
        Ok(state.readahead)
    }

    fn seek_to_new_source(&self, target: i64) -> Result<bool> {
        log::trace!("{}: seek to new source at {}", self.uri, target);
        self.check_open()?;
        Ok(false)
    }
}

impl<S: ObjectStore + ?Sized> fmt::Debug for ObjectStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStream")
            .field("uri", &self.uri)
            .field("content_length", &self.content_length)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl<S: ObjectStore + ?Sized> Drop for ObjectStream<S> {
    fn drop(&mut self) {
        SeekableStream::close(self);
    }
}

impl<S: ObjectStore + ?Sized> Read for &ObjectStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len();
        Ok(SeekableStream::read_into(*self, buf, 0, len)?.unwrap_or(0))
    }
}

impl<S: ObjectStore + ?Sized> Read for ObjectStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(&mut &*self, buf)
    }
}

impl<S: ObjectStore + ?Sized> Seek for &ObjectStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => i64::try_from(n).ok(),
            SeekFrom::Current(delta) => i64::try_from(SeekableStream::position(*self)?)
                .ok()
                .and_then(|p| p.checked_add(delta)),
            SeekFrom::End(delta) => i64::try_from(self.content_length)
                .ok()
                .and_then(|len| len.checked_add(delta)),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek offset out of range")
        })?;

        SeekableStream::seek(*self, target)?;
        Ok(SeekableStream::position(*self)?)
    }
}

impl<S: ObjectStore + ?Sized> Seek for ObjectStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Seek::seek(&mut &*self, pos)
    }
}
