use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::runtime::Runtime;

use super::{Chunk, ObjectStore, clamp_range};
use anyhow::{Result, anyhow, bail};

/// HTTP object store using Range requests
///
/// Objects live at `{base_url}/{container}/{key}`. The async client is
/// driven on a private current-thread runtime, so this store must not be
/// used from inside another tokio runtime.
pub struct HttpObjectStore {
    client: Client,
    runtime: Runtime,
    base_url: String,
    transferred_bytes: AtomicU64,
    max_retry: u32,
}

impl HttpObjectStore {
    /// Create a new HTTP object store rooted at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            client,
            runtime,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transferred_bytes: AtomicU64::new(0),
            max_retry: 10,
        })
    }

    /// Set how many times a timed out or refused request is retried
    pub fn with_max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry.max(1);
        self
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    fn object_url(&self, container: &str, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            container.trim_matches('/'),
            key.trim_start_matches('/')
        )
    }

    async fn head_size(&self, url: &str) -> Result<Option<u64>> {
        let resp = self.client.head(url).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            bail!("HTTP request failed with status: {}", resp.status());
        }

        // Get object size from Content-Length
        let size = resp
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| anyhow!("Remote server did not return Content-Length"))?;

        Ok(Some(size))
    }

    async fn get_range(&self, url: &str, offset: u64, len: u64) -> Result<Option<Chunk>> {
        let Some(range) = range_header(offset, len) else {
            return Ok(Some(Chunk::default()));
        };

        let mut retry_count = 0;
        loop {
            let result = self
                .client
                .get(url)
                .header("Range", &range)
                .send()
                .await;

            match result {
                Ok(resp) => {
                    let status = resp.status();
                    let body = match status {
                        StatusCode::PARTIAL_CONTENT | StatusCode::OK => {
                            resp.bytes().await?.to_vec()
                        }
                        _ => Vec::new(),
                    };
                    let chunk = interpret_response(status, &body, offset, len)?;
                    if let Some(chunk) = &chunk {
                        self.transferred_bytes
                            .fetch_add(body.len() as u64, Ordering::Relaxed);
                        log::debug!("GET {} {} -> {} bytes", url, range, chunk.size());
                    }
                    return Ok(chunk);
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count >= self.max_retry {
                        bail!("Max retries exceeded");
                    }
                    log::warn!(
                        "Connection error, retry {}/{}: {}",
                        retry_count,
                        self.max_retry,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(500 * retry_count as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// `Range` header value for `len` bytes at `offset`, or `None` for an empty range
fn range_header(offset: u64, len: u64) -> Option<String> {
    if len == 0 {
        return None;
    }
    let end = offset.saturating_add(len - 1);
    Some(format!("bytes={}-{}", offset, end))
}

/// Turn a response to a ranged GET into a fetch result
fn interpret_response(
    status: StatusCode,
    body: &[u8],
    offset: u64,
    len: u64,
) -> Result<Option<Chunk>> {
    match status {
        StatusCode::PARTIAL_CONTENT => {
            let take = body.len().min(len as usize);
            Ok(Some(Chunk::new(body[..take].to_vec())))
        }
        // Server ignored the Range header and sent the whole object
        StatusCode::OK => Ok(clamp_range(body.len() as u64, offset, len)
            .map(|r| Chunk::new(body[r.start as usize..r.end as usize].to_vec()))),
        // Any range of an empty object is unsatisfiable, including the first
        StatusCode::RANGE_NOT_SATISFIABLE if offset == 0 => Ok(Some(Chunk::default())),
        StatusCode::NOT_FOUND | StatusCode::RANGE_NOT_SATISFIABLE => Ok(None),
        _ => bail!("HTTP request failed with status: {}", status),
    }
}

impl ObjectStore for HttpObjectStore {
    fn fetch_range(
        &self,
        container: &str,
        key: &str,
        offset: u64,
        len: u64,
    ) -> Result<Option<Chunk>> {
        let url = self.object_url(container, key);
        self.runtime.block_on(self.get_range(&url, offset, len))
    }

    fn object_size(&self, container: &str, key: &str) -> Result<Option<u64>> {
        let url = self.object_url(container, key);
        self.runtime.block_on(self.head_size(&url))
    }

    fn object_uri(&self, container: &str, key: &str) -> String {
        self.object_url(container, key)
    }
}
