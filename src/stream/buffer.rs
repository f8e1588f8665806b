//! The chunk currently held by a stream.

use crate::io::Chunk;

/// Where a position falls relative to the buffered range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
    /// Inside the range; carries the offset within the chunk.
    Hit(usize),
    /// At or past the end of the range.
    ForwardMiss,
    /// Before the start of the range.
    BackwardMiss,
}

/// Bytes of one fetched chunk together with the absolute range
/// `[start, finish)` they cover.
///
/// `finish - start` always equals `data.len()`.
#[derive(Debug, Default)]
pub(crate) struct RangeBuffer {
    start: u64,
    finish: u64,
    data: Vec<u8>,
}

impl RangeBuffer {
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn start(&self) -> u64 {
        self.start
    }

    pub(crate) fn finish(&self) -> u64 {
        self.finish
    }

    pub(crate) fn locate(&self, position: u64) -> Lookup {
        if position < self.start {
            Lookup::BackwardMiss
        } else if position >= self.finish {
            Lookup::ForwardMiss
        } else {
            Lookup::Hit((position - self.start) as usize)
        }
    }

    /// Replace the held chunk with `chunk`, which begins at `start`.
    pub(crate) fn replace(&mut self, start: u64, chunk: Chunk) {
        self.data = chunk.into_data();
        self.start = start;
        self.finish = start + self.data.len() as u64;
    }

    /// Bytes of the chunk from `offset` (chunk-relative) to its end.
    pub(crate) fn bytes_from(&self, offset: usize) -> &[u8] {
        &self.data[offset.min(self.data.len())..]
    }

    pub(crate) fn clear(&mut self) {
        self.data = Vec::new();
        self.start = 0;
        self.finish = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_at(start: u64, data: &[u8]) -> RangeBuffer {
        let mut buffer = RangeBuffer::empty();
        buffer.replace(start, Chunk::new(data.to_vec()));
        buffer
    }

    #[test]
    fn empty_buffer_misses_forward() {
        let buffer = RangeBuffer::empty();
        assert_eq!(buffer.locate(0), Lookup::ForwardMiss);
        assert_eq!(buffer.bytes_from(0), &[] as &[u8]);
    }

    #[test]
    fn locate_classifies_positions() {
        let buffer = buffer_at(6, &[6, 7, 8, 9]);
        assert_eq!(buffer.start(), 6);
        assert_eq!(buffer.finish(), 10);
        assert_eq!(buffer.locate(5), Lookup::BackwardMiss);
        assert_eq!(buffer.locate(10), Lookup::ForwardMiss);
        assert_eq!(buffer.locate(6), Lookup::Hit(0));
        assert_eq!(buffer.locate(9), Lookup::Hit(3));
    }

    #[test]
    fn offset_is_relative_to_range_start() {
        // start 4, position 9: 9 % 4 would give 1, the chunk offset is 5
        let buffer = buffer_at(4, &[4, 5, 6, 7, 8, 9, 10, 11]);
        assert_eq!(buffer.locate(9), Lookup::Hit(5));
        assert_eq!(buffer.bytes_from(5), &[9, 10, 11]);
    }

    #[test]
    fn clear_drops_chunk() {
        let mut buffer = buffer_at(2, &[1, 2, 3]);
        buffer.clear();
        assert_eq!(buffer.finish(), 0);
        assert_eq!(buffer.locate(2), Lookup::ForwardMiss);
    }
}
