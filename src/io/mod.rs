mod http;
mod local;
mod memory;

pub use http::HttpObjectStore;
pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;

use anyhow::Result;

/// Bytes returned by one range fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    data: Vec<u8>,
}

impl Chunk {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Trait for fetching byte ranges of objects held in a remote store
///
/// Objects are addressed by a container (bucket) and a key. Implementations
/// share one convention for `fetch_range`: an offset inside the object yields
/// up to `len` bytes, offset 0 of an empty object yields an empty chunk, and
/// any other offset past the end, or a missing object, yields `None`.
pub trait ObjectStore: Send + Sync {
    /// Fetch up to `len` bytes of `container/key` starting at `offset`
    fn fetch_range(&self, container: &str, key: &str, offset: u64, len: u64)
    -> Result<Option<Chunk>>;

    /// Get the total size of an object, or `None` if it does not exist
    fn object_size(&self, container: &str, key: &str) -> Result<Option<u64>>;

    /// Release whatever the store holds for an object once a stream is done with it
    fn release(&self, _container: &str, _key: &str) -> Result<()> {
        Ok(())
    }

    /// Human readable address of an object, used in errors and logs
    fn object_uri(&self, container: &str, key: &str) -> String {
        format!("{}/{}", container, key)
    }
}

/// Clamp a fetch of `len` bytes at `offset` against an object of `size` bytes.
///
/// Returns the byte range to copy, or `None` when the offset is outside the
/// object.
pub(crate) fn clamp_range(size: u64, offset: u64, len: u64) -> Option<std::ops::Range<u64>> {
    if size == 0 && offset == 0 {
        return Some(0..0);
    }
    if offset >= size {
        return None;
    }
    let end = offset.saturating_add(len).min(size);
    Some(offset..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(10, 0, 4, Some(0..4))]
    #[case(10, 6, 4, Some(6..10))]
    #[case(10, 8, 4, Some(8..10))]
    #[case(10, 10, 4, None)]
    #[case(10, 11, 4, None)]
    #[case(0, 0, 4, Some(0..0))]
    #[case(0, 1, 4, None)]
    #[case(10, 2, u64::MAX, Some(2..10))]
    fn clamps_ranges(
        #[case] size: u64,
        #[case] offset: u64,
        #[case] len: u64,
        #[case] expected: Option<std::ops::Range<u64>>,
    ) {
        assert_eq!(clamp_range(size, offset, len), expected);
    }

    #[test]
    fn chunk_reports_size() {
        let mut chunk = Chunk::new(vec![1, 2, 3]);
        assert_eq!(chunk.size(), 3);
        chunk.truncate(1);
        assert_eq!(chunk.data(), &[1]);
        assert!(Chunk::default().is_empty());
    }
}
