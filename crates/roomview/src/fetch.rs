//! Byte sources for scene assets.
//!
//! This module provides a `Fetch` trait and implementations that read
//! asset bytes by path relative to an asset root.
//!
//! # Implementations
//!
//! - [`HttpFetcher`]: HTTP(S) via reqwest, native and WASM
//! - [`FsFetcher`]: Local filesystem via Tokio (native only)
//! - [`MemoryFetcher`]: In-memory map, for embedded assets and tests

use crate::error::{LoadFailure, Result};
use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{Arc, RwLock},
};

/// Future type for fetch operations.
#[cfg(not(target_family = "wasm"))]
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>>;

/// Future type for fetch operations.
///
/// Browser fetch futures are not `Send`; the browser is single-threaded.
#[cfg(target_family = "wasm")]
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>>> + 'a>>;

/// A source of asset bytes.
///
/// Paths are relative to the fetcher's root and use `/` separators, as
/// they appear in glTF buffer URIs.
pub trait Fetch: Send + Sync {
    /// Fetch the full contents of `path`.
    fn fetch<'a>(&'a self, path: &'a str) -> FetchFuture<'a>;
}

/// Join a relative reference onto the directory of `base`.
///
/// `resolve_relative("models/roomScene.gltf", "roomScene.bin")` is
/// `models/roomScene.bin`. Absolute URLs are returned unchanged.
#[must_use]
pub fn resolve_relative(base: &str, reference: &str) -> String {
    if reference.contains("://") || reference.starts_with('/') {
        return reference.to_string();
    }
    match base.rfind('/') {
        Some(slash) => format!("{}{reference}", &base[..=slash]),
        None => reference.to_string(),
    }
}

/// Fetches assets over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    /// Create a fetcher rooted at `base_url`.
    ///
    /// A trailing `/` is added when missing.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    /// Create a fetcher with a custom HTTP client.
    #[must_use]
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.is_empty() && !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { http, base_url }
    }

    /// The URL `path` resolves to.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        if path.contains("://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path.trim_start_matches('/'))
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch<'a>(&'a self, path: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            let url = self.url_for(path);
            tracing::debug!(%url, "fetching");

            let response = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(|e| LoadFailure::Http {
                    url: url.clone(),
                    message: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(LoadFailure::HttpStatus {
                    url,
                    status: status.as_u16(),
                });
            }

            let data = response.bytes().await.map_err(|e| LoadFailure::Http {
                url: url.clone(),
                message: e.to_string(),
            })?;
            Ok(data.to_vec())
        })
    }
}

/// Reads assets from a directory on disk.
///
/// Paths are percent-decoded before lookup, so `room%20scene.bin` reads the
/// file `room scene.bin`. Reads go through `tokio::fs` and must be polled
/// inside a Tokio runtime.
#[cfg(not(target_family = "wasm"))]
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: std::path::PathBuf,
}

#[cfg(not(target_family = "wasm"))]
impl FsFetcher {
    /// Create a fetcher rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[cfg(not(target_family = "wasm"))]
impl Fetch for FsFetcher {
    fn fetch<'a>(&'a self, path: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            let decoded = urlencoding::decode(path).map_err(|e| LoadFailure::InvalidData {
                context: "asset path",
                detail: format!("{path}: {e}"),
            })?;
            let full = self.root.join(decoded.trim_start_matches('/'));
            tracing::debug!(path = %full.display(), "reading");
            tokio::fs::read(&full).await.map_err(|e| LoadFailure::Io {
                path: full.display().to_string(),
                message: e.to_string(),
            })
        })
    }
}

/// Serves assets from memory.
///
/// Missing paths fail like a 404 response.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryFetcher {
    /// Create an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn insert(&self, path: impl Into<String>, data: Vec<u8>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(path.into(), data);
        }
    }

    /// Builder form of [`MemoryFetcher::insert`].
    #[must_use]
    pub fn with(self, path: impl Into<String>, data: Vec<u8>) -> Self {
        self.insert(path, data);
        self
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Fetch for MemoryFetcher {
    fn fetch<'a>(&'a self, path: &'a str) -> FetchFuture<'a> {
        let result = self
            .entries
            .read()
            .map_err(|e| LoadFailure::InvalidData {
                context: "memory fetcher",
                detail: e.to_string(),
            })
            .and_then(|entries| {
                entries.get(path).cloned().ok_or(LoadFailure::HttpStatus {
                    url: path.to_string(),
                    status: 404,
                })
            });
        Box::pin(async move { result })
    }
}
