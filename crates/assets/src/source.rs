//! Asset sources: where scene files come from.
//!
//! Sources fetch raw bytes by layout-relative path. Fetches are plain async
//! calls; timeouts are left to the transport underneath.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::PathBuf;

use crate::AssetError;

/// Platform-agnostic asset fetcher.
pub trait AssetSource: Send + Sync + 'static {
    /// Fetch the file at `path` (relative to the source root).
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, AssetError>> + Send;

    /// Human-readable root, for logs.
    fn describe(&self) -> String;
}

/// Reads scene folders from a local directory.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for FsSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let full = self.root.join(path);
        tokio::fs::read(&full).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AssetError::NotFound(full.display().to_string())
            } else {
                AssetError::Io {
                    path: full.display().to_string(),
                    source,
                }
            }
        })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Fetches scene folders from an HTTP(S) base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_client(base, reqwest::Client::new())
    }

    pub fn with_client(base: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }
}

impl AssetSource for HttpSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let url = self.url(path);
        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AssetError::NotFound(url));
        }
        let bytes = response.error_for_status()?.bytes().await?;
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        self.base.clone()
    }
}

/// Either a directory or an HTTP base, chosen from the base path's scheme.
#[derive(Debug, Clone)]
pub enum AnySource {
    Fs(FsSource),
    Http(HttpSource),
}

impl AnySource {
    pub fn from_base(base: &str) -> Self {
        if base.starts_with("http://") || base.starts_with("https://") {
            Self::Http(HttpSource::new(base))
        } else {
            Self::Fs(FsSource::new(base))
        }
    }
}

impl AssetSource for AnySource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        match self {
            Self::Fs(s) => s.fetch(path).await,
            Self::Http(s) => s.fetch(path).await,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Fs(s) => s.describe(),
            Self::Http(s) => s.describe(),
        }
    }
}

/// In-memory files with optional forced failures.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> &mut Self {
        self.files.insert(path.into(), bytes.into());
        self
    }

    /// Make every fetch of `path` fail, even if the file exists.
    pub fn fail(&mut self, path: impl Into<String>) -> &mut Self {
        self.failing.insert(path.into());
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl AssetSource for MemorySource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        if self.failing.contains(path) {
            return Err(AssetError::NotFound(format!("{path} (forced failure)")));
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }

    fn describe(&self) -> String {
        format!("memory ({} files)", self.files.len())
    }
}
