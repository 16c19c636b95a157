//! Backing stores for the scan cache
//!
//! The local store is a JSON file next to the repository. The remote store is a
//! single shared object reached with plain HTTP GET/PUT, typically a pre-signed
//! object-store URL, so several CI runners can share results.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Local JSON cache file
#[derive(Debug, Clone)]
pub struct LocalCacheFile {
    path: PathBuf,
}

impl LocalCacheFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File bytes, or `None` when the file does not exist yet
    pub fn read(&self) -> io::Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write through a sibling temp file so a crash never leaves half a cache
    pub fn write(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = PathBuf::from(format!("{}.tmp", self.path.display()));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)
    }
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Stored bytes, or `None` when nothing has been uploaded yet
    async fn fetch(&self) -> Result<Option<Vec<u8>>>;

    async fn upload(&self, bytes: Vec<u8>) -> Result<()>;

    /// Human-readable location for log lines
    fn describe(&self) -> String;
}

/// Shared cache object behind one URL
pub struct HttpBlobStore {
    url: String,
    http_client: Client,
}

impl HttpBlobStore {
    pub fn new(url: &str) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            url: url.to_string(),
            http_client,
        }
    }
}

#[async_trait]
impl RemoteStore for HttpBlobStore {
    async fn fetch(&self) -> Result<Option<Vec<u8>>> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .context("Failed to fetch remote cache")?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(anyhow!("Remote cache fetch returned status {}", status));
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read remote cache body")?;
        Ok(Some(bytes.to_vec()))
    }

    async fn upload(&self, bytes: Vec<u8>) -> Result<()> {
        let response = self
            .http_client
            .put(&self.url)
            .header("Content-Type", "application/json")
            .body(bytes)
            .send()
            .await
            .context("Failed to upload remote cache")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Remote cache upload returned status {}", status));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        // Pre-signed URLs carry credentials in the query string
        self.url.split('?').next().unwrap_or_default().to_string()
    }
}
