use anyhow::{Result, bail};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use super::{Chunk, ObjectStore, clamp_range};

/// In-memory object store
///
/// Keeps every fetch request so callers can see exactly which ranges a
/// stream asked for.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
    fetches: Mutex<Vec<(u64, u64)>>,
    releases: Mutex<Vec<(String, String)>>,
    fail_fetches: AtomicBool,
    fail_releases: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` under `container/key`, replacing any previous object
    pub fn put(&self, container: &str, key: &str, data: impl Into<Vec<u8>>) {
        let mut objects = self.objects.write().unwrap_or_else(|e| e.into_inner());
        objects.insert((container.to_string(), key.to_string()), data.into());
    }

    pub fn remove(&self, container: &str, key: &str) -> Option<Vec<u8>> {
        let mut objects = self.objects.write().unwrap_or_else(|e| e.into_inner());
        objects.remove(&(container.to_string(), key.to_string()))
    }

    /// `(offset, len)` of every fetch requested so far, oldest first
    pub fn fetch_log(&self) -> Vec<(u64, u64)> {
        self.fetches.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn releases(&self) -> Vec<(String, String)> {
        self.releases.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Make every following fetch fail with a transport error
    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::Relaxed);
    }

    /// Make every following release fail
    pub fn fail_releases(&self, fail: bool) {
        self.fail_releases.store(fail, Ordering::Relaxed);
    }
}

impl ObjectStore for MemoryObjectStore {
    fn fetch_range(
        &self,
        container: &str,
        key: &str,
        offset: u64,
        len: u64,
    ) -> Result<Option<Chunk>> {
        self.fetches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((offset, len));

        if self.fail_fetches.load(Ordering::Relaxed) {
            bail!("injected fetch failure for {}/{}", container, key);
        }

        let objects = self.objects.read().unwrap_or_else(|e| e.into_inner());
        let Some(data) = objects.get(&(container.to_string(), key.to_string())) else {
            return Ok(None);
        };

        Ok(clamp_range(data.len() as u64, offset, len)
            .map(|range| Chunk::new(data[range.start as usize..range.end as usize].to_vec())))
    }

    fn object_size(&self, container: &str, key: &str) -> Result<Option<u64>> {
        let objects = self.objects.read().unwrap_or_else(|e| e.into_inner());
        Ok(objects
            .get(&(container.to_string(), key.to_string()))
            .map(|data| data.len() as u64))
    }

    fn release(&self, container: &str, key: &str) -> Result<()> {
        self.releases
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((container.to_string(), key.to_string()));

        if self.fail_releases.load(Ordering::Relaxed) {
            bail!("injected release failure for {}/{}", container, key);
        }
        Ok(())
    }

    fn object_uri(&self, container: &str, key: &str) -> String {
        format!("mem://{}/{}", container, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetches_clamped_ranges() {
        let store = MemoryObjectStore::new();
        store.put("bucket", "obj", (0u8..10).collect::<Vec<_>>());

        let chunk = store.fetch_range("bucket", "obj", 8, 4).unwrap().unwrap();
        assert_eq!(chunk.data(), &[8, 9]);
        assert!(store.fetch_range("bucket", "obj", 10, 4).unwrap().is_none());
        assert_eq!(store.fetch_log(), vec![(8, 4), (10, 4)]);
    }

    #[test]
    fn missing_object_is_absent() {
        let store = MemoryObjectStore::new();
        assert!(store.fetch_range("bucket", "nope", 0, 4).unwrap().is_none());
        assert_eq!(store.object_size("bucket", "nope").unwrap(), None);
    }

    #[test]
    fn empty_object_yields_empty_chunk() {
        let store = MemoryObjectStore::new();
        store.put("bucket", "empty", Vec::new());
        let chunk = store.fetch_range("bucket", "empty", 0, 4).unwrap().unwrap();
        assert!(chunk.is_empty());
        assert_eq!(store.object_size("bucket", "empty").unwrap(), Some(0));
    }

    #[test]
    fn injected_failures() {
        let store = MemoryObjectStore::new();
        store.put("bucket", "obj", vec![1]);
        store.fail_fetches(true);
        assert!(store.fetch_range("bucket", "obj", 0, 1).is_err());
        store.fail_releases(true);
        assert!(store.release("bucket", "obj").is_err());
        assert_eq!(store.releases().len(), 1);
    }
}
