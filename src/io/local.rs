use super::{Chunk, ObjectStore, clamp_range};
use anyhow::{Result, bail};
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Object store backed by a local directory
///
/// Containers are directories directly below `root`; keys are relative
/// paths inside a container.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, container: &str, key: &str) -> Result<PathBuf> {
        for part in [container, key] {
            let escapes = Path::new(part)
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
            if escapes {
                bail!("object name escapes the store root: {}", part);
            }
        }
        Ok(self.root.join(container).join(key))
    }

    fn open(&self, container: &str, key: &str) -> Result<Option<File>> {
        let path = self.object_path(container, key)?;
        match File::open(&path) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Fill `buf` from `offset`, stopping early only at end of file
fn read_full_at(file: &File, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = read_at(file, offset + filled as u64, &mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[cfg(unix)]
fn read_at(file: &File, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

#[cfg(not(any(unix, windows)))]
fn read_at(file: &File, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
    use std::io::{Read, Seek, SeekFrom};
    // Each fetch opens its own handle, so moving the cursor is safe here
    let mut file = file;
    file.seek(SeekFrom::Start(offset))?;
    file.read(buf)
}

impl ObjectStore for LocalObjectStore {
    fn fetch_range(
        &self,
        container: &str,
        key: &str,
        offset: u64,
        len: u64,
    ) -> Result<Option<Chunk>> {
        let Some(file) = self.open(container, key)? else {
            return Ok(None);
        };
        let size = file.metadata()?.len();

        let Some(range) = clamp_range(size, offset, len) else {
            return Ok(None);
        };

        let mut data = vec![0u8; (range.end - range.start) as usize];
        let n = read_full_at(&file, range.start, &mut data)?;
        data.truncate(n);
        Ok(Some(Chunk::new(data)))
    }

    fn object_size(&self, container: &str, key: &str) -> Result<Option<u64>> {
        match self.open(container, key)? {
            Some(file) => Ok(Some(file.metadata()?.len())),
            None => Ok(None),
        }
    }

    fn object_uri(&self, container: &str, key: &str) -> String {
        self.root.join(container).join(key).display().to_string()
    }
}
