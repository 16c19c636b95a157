//! Content-addressed scan cache
//!
//! Maps a file path to the SHA-256 digest of the content last scanned there and
//! the result of that scan. A lookup only hits when the current digest matches
//! the stored one, so any edit forces a rescan. Broken stores degrade to an
//! empty cache: the worst case is a rescan, never a stale hit.

pub mod store;

pub use store::{HttpBlobStore, LocalCacheFile, RemoteStore};

use crate::models::ScanResult;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRecord {
    pub hash: String,
    #[serde(default)]
    pub result: Option<ScanResult>,
    pub timestamp: String,
}

pub struct ContentAddressedCache {
    records: BTreeMap<String, FileRecord>,
    local: Option<LocalCacheFile>,
    remote: Option<Box<dyn RemoteStore>>,
    dirty: bool,
}

impl ContentAddressedCache {
    /// A cache with no backing store
    pub fn in_memory() -> Self {
        Self {
            records: BTreeMap::new(),
            local: None,
            remote: None,
            dirty: false,
        }
    }

    /// SHA-256 of `content` as lowercase hex
    pub fn hash(content: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        format!("{:x}", hasher.finalize())
    }

    /// Load records from the remote store, then overlay newer local records
    ///
    /// With a retention window, records older than the window (or with an
    /// unreadable timestamp) are dropped. Never fails; unreadable or corrupt
    /// stores contribute nothing.
    pub async fn load(
        local: Option<LocalCacheFile>,
        remote: Option<Box<dyn RemoteStore>>,
        retention: Option<Duration>,
    ) -> Self {
        let mut records = BTreeMap::new();

        if let Some(remote) = &remote {
            match remote.fetch().await {
                Ok(Some(bytes)) => records = decode_records(&bytes, &remote.describe()),
                Ok(None) => debug!(store = %remote.describe(), "remote cache is empty"),
                Err(e) => warn!(store = %remote.describe(), error = %e, "remote cache unavailable"),
            }
        }

        if let Some(local) = &local {
            match local.read() {
                Ok(Some(bytes)) => {
                    let origin = local.path().display().to_string();
                    for (path, record) in decode_records(&bytes, &origin) {
                        let keep_existing = records
                            .get(&path)
                            .map(|existing| is_newer(existing, &record))
                            .unwrap_or(false);
                        if !keep_existing {
                            records.insert(path, record);
                        }
                    }
                }
                Ok(None) => debug!(path = %local.path().display(), "no local cache yet"),
                Err(e) => warn!(path = %local.path().display(), error = %e, "local cache unreadable"),
            }
        }

        if let Some(window) = retention {
            let evicted = evict_older_than(&mut records, Utc::now() - window);
            if evicted > 0 {
                info!(evicted, "dropped expired cache records");
            }
        }

        info!(records = records.len(), "scan cache loaded");
        Self {
            records,
            local,
            remote,
            dirty: false,
        }
    }

    /// Stored result for `path` if `content` is what was scanned last time
    pub fn lookup(&self, path: &str, content: &[u8]) -> Option<&ScanResult> {
        self.lookup_digest(path, &Self::hash(content))
    }

    pub fn lookup_digest(&self, path: &str, digest: &str) -> Option<&ScanResult> {
        self.records
            .get(path)
            .filter(|record| record.hash == digest)
            .and_then(|record| record.result.as_ref())
    }

    /// Overwrite the record for `path`
    pub fn store(&mut self, path: &str, digest: &str, result: ScanResult) {
        self.records.insert(
            path.to_string(),
            FileRecord {
                hash: digest.to_string(),
                result: Some(result),
                timestamp: Utc::now().to_rfc3339(),
            },
        );
        self.dirty = true;
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.records.get(path)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flush to the local file only; failures are logged
    pub fn persist_local(&mut self) {
        let Some(local) = &self.local else {
            return;
        };
        let Some(bytes) = self.encode() else {
            return;
        };

        match local.write(&bytes) {
            Ok(()) => {
                self.dirty = false;
                debug!(path = %local.path().display(), records = self.records.len(), "cache saved");
            }
            Err(e) => warn!(path = %local.path().display(), error = %e, "failed to save cache"),
        }
    }

    /// Flush to every configured store; failures are logged
    pub async fn persist(&mut self) {
        self.persist_local();

        let Some(remote) = &self.remote else {
            return;
        };
        let Some(bytes) = self.encode() else {
            return;
        };
        match remote.upload(bytes).await {
            Ok(()) => debug!(store = %remote.describe(), "remote cache uploaded"),
            Err(e) => warn!(store = %remote.describe(), error = %e, "failed to upload remote cache"),
        }
    }

    fn encode(&self) -> Option<Vec<u8>> {
        match serde_json::to_vec_pretty(&self.records) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, "failed to serialize cache");
                None
            }
        }
    }
}

impl Drop for ContentAddressedCache {
    fn drop(&mut self) {
        if self.dirty {
            self.persist_local();
        }
    }
}

/// Parse a cache document, skipping records that do not decode
pub fn decode_records(bytes: &[u8], origin: &str) -> BTreeMap<String, FileRecord> {
    let document = match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!(origin, "cache document is not an object, starting empty");
            return BTreeMap::new();
        }
        Err(e) => {
            warn!(origin, error = %e, "cache document is corrupt, starting empty");
            return BTreeMap::new();
        }
    };

    let mut records = BTreeMap::new();
    for (path, value) in document {
        match serde_json::from_value::<FileRecord>(value) {
            Ok(record) => {
                records.insert(path, record);
            }
            Err(e) => debug!(origin, path = %path, error = %e, "skipping malformed cache record"),
        }
    }
    records
}

/// Drop records stamped before `cutoff` or with an unparseable timestamp
pub fn evict_older_than(records: &mut BTreeMap<String, FileRecord>, cutoff: DateTime<Utc>) -> usize {
    let before = records.len();
    records.retain(|_, record| {
        DateTime::parse_from_rfc3339(&record.timestamp)
            .map(|stamp| stamp.with_timezone(&Utc) >= cutoff)
            .unwrap_or(false)
    });
    before - records.len()
}

/// Whether `existing` was stamped after `incoming`
fn is_newer(existing: &FileRecord, incoming: &FileRecord) -> bool {
    let parse = |ts: &str| DateTime::parse_from_rfc3339(ts).ok();
    match (parse(&existing.timestamp), parse(&incoming.timestamp)) {
        (Some(a), Some(b)) => a > b,
        (Some(_), None) => true,
        _ => false,
    }
}
