use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::assets::decode::{PreparedImage, decode_image};
use crate::foundation::error::{StudioError, StudioResult};

/// Raw bytes of a fetched image plus its cross-origin status.
#[derive(Clone, Debug)]
pub struct FetchedImage {
    /// Encoded image bytes (PNG, JPEG, ...).
    pub bytes: Vec<u8>,
    /// `false` when the image came from a foreign origin without CORS permission. Such pixels
    /// can be displayed but taint every export that draws them.
    pub cors_cleared: bool,
}

/// A decoded image together with its taint marker.
#[derive(Clone, Debug)]
pub struct LoadedImage {
    pub image: PreparedImage,
    pub tainted: bool,
}

/// Source of image bytes for backgrounds and design layers.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch the bytes behind `url`.
    async fn fetch(&self, url: &str) -> StudioResult<FetchedImage>;
}

/// Fetch and decode `url`. An empty URL is an asset error, never a panic.
pub async fn load_image(fetcher: &dyn ImageFetcher, url: &str) -> StudioResult<LoadedImage> {
    if url.trim().is_empty() {
        return Err(StudioError::asset("image source is empty"));
    }
    let fetched = fetcher.fetch(url).await?;
    let image = decode_image(&fetched.bytes)
        .map_err(|e| StudioError::asset(format!("decode '{url}': {e}")))?;
    Ok(LoadedImage {
        image,
        tainted: !fetched.cors_cleared,
    })
}

/// HTTP image fetcher.
///
/// Images served from the API origin are always cleared; foreign origins must answer with an
/// `Access-Control-Allow-Origin` header.
#[derive(Clone, Debug)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
    trusted_origin: Option<reqwest::Url>,
}

impl HttpImageFetcher {
    pub fn new(client: reqwest::Client, api_base: &str) -> Self {
        Self {
            client,
            trusted_origin: reqwest::Url::parse(api_base).ok(),
        }
    }

    fn same_origin(&self, url: &reqwest::Url) -> bool {
        self.trusted_origin
            .as_ref()
            .is_some_and(|t| t.origin() == url.origin())
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> StudioResult<FetchedImage> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| StudioError::asset(format!("invalid image url '{url}': {e}")))?;
        let resp = self
            .client
            .get(parsed.clone())
            .send()
            .await?
            .error_for_status()
            .map_err(|e| StudioError::asset(format!("fetch '{url}': {e}")))?;
        let cors_cleared = self.same_origin(&parsed)
            || resp.headers().contains_key("access-control-allow-origin");
        let bytes = resp.bytes().await?.to_vec();
        Ok(FetchedImage {
            bytes,
            cors_cleared,
        })
    }
}

/// Reads images from a local directory; sources are relative paths below `root`.
#[derive(Clone, Debug)]
pub struct LocalImageFetcher {
    root: PathBuf,
}

impl LocalImageFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ImageFetcher for LocalImageFetcher {
    async fn fetch(&self, url: &str) -> StudioResult<FetchedImage> {
        let rel = url.strip_prefix("file://").unwrap_or(url);
        let norm = normalize_rel_path(rel)?;
        let p = self.root.join(Path::new(&norm));
        let bytes = tokio::fs::read(&p).await.map_err(|e| {
            StudioError::asset(format!("failed to read image '{}': {e}", p.display()))
        })?;
        Ok(FetchedImage {
            bytes,
            cors_cleared: true,
        })
    }
}

#[derive(Clone, Debug)]
struct MemoryEntry {
    image: FetchedImage,
    delay: Option<Duration>,
}

/// In-memory fetcher for tests and offline sessions.
#[derive(Debug, Default)]
pub struct MemoryImageFetcher {
    entries: HashMap<String, MemoryEntry>,
    fetches: AtomicUsize,
}

impl MemoryImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a same-origin image.
    pub fn with_image(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(url.into(), bytes, true, None);
        self
    }

    /// Register an image that arrives without CORS permission.
    pub fn with_tainted_image(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(url.into(), bytes, false, None);
        self
    }

    /// Register an image that is only delivered after `delay`.
    pub fn with_slow_image(mut self, url: impl Into<String>, bytes: Vec<u8>, delay: Duration) -> Self {
        self.insert(url.into(), bytes, true, Some(delay));
        self
    }

    /// Number of `fetch` calls served so far (hits and misses).
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn insert(&mut self, url: String, bytes: Vec<u8>, cors_cleared: bool, delay: Option<Duration>) {
        self.entries.insert(
            url,
            MemoryEntry {
                image: FetchedImage {
                    bytes,
                    cors_cleared,
                },
                delay,
            },
        );
    }
}

#[async_trait]
impl ImageFetcher for MemoryImageFetcher {
    async fn fetch(&self, url: &str) -> StudioResult<FetchedImage> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let entry = self
            .entries
            .get(url)
            .cloned()
            .ok_or_else(|| StudioError::asset(format!("no image registered for '{url}'")))?;
        if let Some(d) = entry.delay {
            tokio::time::sleep(d).await;
        }
        Ok(entry.image)
    }
}

/// Normalize and validate root-relative image paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub(crate) fn normalize_rel_path(source: &str) -> StudioResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(StudioError::asset("image paths must be relative"));
    }
    if s.is_empty() {
        return Err(StudioError::asset("image path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(StudioError::asset("image paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(StudioError::asset("image path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
