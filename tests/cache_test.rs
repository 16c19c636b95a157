//! Integration tests for the content-addressed cache
//!
//! Covers the local file and remote object stores together:
//! - Hash sensitivity and idempotent stores
//! - Remote records with newer local overlays
//! - Corrupt stores degrade to an empty cache
//! - Retention only evicts when configured

mod common;

use chrono::{Duration, Utc};
use common::MemoryRemoteStore;
use complyscan::cache::{ContentAddressedCache, FileRecord, LocalCacheFile, RemoteStore};
use complyscan::models::{Issue, ScanResult, Severity};
use complyscan::scanner::Language;
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use tempfile::TempDir;

fn result_with_issue(path: &str) -> ScanResult {
    ScanResult::new(path, Language::Python, Some("flask".to_string())).with_issues(vec![
        Issue::new(4, Severity::High, "hardcoded_credentials", "Hardcoded password")
            .with_standards(["PCI-DSS"]),
    ])
}

fn document(records: Vec<(&str, &str, String)>) -> Vec<u8> {
    let map: BTreeMap<String, FileRecord> = records
        .into_iter()
        .map(|(path, hash, timestamp)| {
            (
                path.to_string(),
                FileRecord {
                    hash: hash.to_string(),
                    result: Some(ScanResult::new(path, Language::Terraform, None)),
                    timestamp,
                },
            )
        })
        .collect();
    serde_json::to_vec(&map).unwrap()
}

fn boxed(store: &MemoryRemoteStore) -> Option<Box<dyn RemoteStore>> {
    Some(Box::new(store.clone()))
}

// ============= Hashing Tests =============

#[test]
fn test_hash_is_stable_and_sensitive() {
    let content = b"resource \"aws_s3_bucket\" \"logs\" {}\n";
    assert_eq!(
        ContentAddressedCache::hash(content),
        ContentAddressedCache::hash(content)
    );

    for idx in [0, content.len() / 2, content.len() - 1] {
        let mut edited = content.to_vec();
        edited[idx] = edited[idx].wrapping_add(1);
        assert_ne!(
            ContentAddressedCache::hash(content),
            ContentAddressedCache::hash(&edited)
        );
    }
    assert_eq!(ContentAddressedCache::hash(content).len(), 64);
}

#[test]
fn test_store_is_idempotent() {
    let mut cache = ContentAddressedCache::in_memory();
    let content = b"password = 'hunter22'";
    let digest = ContentAddressedCache::hash(content);

    cache.store("app.py", &digest, result_with_issue("app.py"));
    cache.store("app.py", &digest, result_with_issue("app.py"));

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.lookup("app.py", content), Some(&result_with_issue("app.py")));
}

// ============= Remote Store Tests =============

#[tokio::test]
async fn test_remote_records_are_loaded_and_uploaded() {
    let now = Utc::now().to_rfc3339();
    let remote = MemoryRemoteStore::with_blob(&document(vec![("main.tf", "abc", now)]));

    let mut cache = ContentAddressedCache::load(None, boxed(&remote), None).await;
    assert_eq!(cache.get("main.tf").unwrap().hash, "abc");

    cache.store("app.py", "def", result_with_issue("app.py"));
    cache.persist().await;

    assert_eq!(remote.uploads.load(Ordering::SeqCst), 1);
    let reloaded = ContentAddressedCache::load(None, boxed(&remote), None).await;
    assert_eq!(reloaded.len(), 2);
}

#[tokio::test]
async fn test_newer_local_record_wins_over_remote() {
    let temp_dir = TempDir::new().unwrap();
    let local_path = temp_dir.path().join("cache.json");
    let older = (Utc::now() - Duration::hours(2)).to_rfc3339();
    let newer = Utc::now().to_rfc3339();

    let remote = MemoryRemoteStore::with_blob(&document(vec![
        ("main.tf", "remote-hash", older.clone()),
        ("vars.tf", "remote-vars", newer.clone()),
    ]));
    std::fs::write(
        &local_path,
        document(vec![
            ("main.tf", "local-hash", newer),
            ("vars.tf", "local-vars", older),
        ]),
    )
    .unwrap();

    let cache =
        ContentAddressedCache::load(Some(LocalCacheFile::new(&local_path)), boxed(&remote), None).await;

    assert_eq!(cache.get("main.tf").unwrap().hash, "local-hash");
    assert_eq!(cache.get("vars.tf").unwrap().hash, "remote-vars");
}

// ============= Corruption Tests =============

#[tokio::test]
async fn test_corrupt_remote_and_local_degrade_to_empty() {
    let temp_dir = TempDir::new().unwrap();
    let local_path = temp_dir.path().join("cache.json");
    std::fs::write(&local_path, b"\x00\x01not json").unwrap();
    let remote = MemoryRemoteStore::with_blob(b"<html>Access Denied</html>");

    let cache =
        ContentAddressedCache::load(Some(LocalCacheFile::new(&local_path)), boxed(&remote), None).await;

    assert!(cache.is_empty());
    assert!(cache.lookup("main.tf", b"anything").is_none());
}

#[tokio::test]
async fn test_stored_hash_mismatch_is_a_miss() {
    let remote = MemoryRemoteStore::with_blob(&document(vec![(
        "main.tf",
        "0000000000000000000000000000000000000000000000000000000000000000",
        Utc::now().to_rfc3339(),
    )]));
    let cache = ContentAddressedCache::load(None, boxed(&remote), None).await;

    assert_eq!(cache.len(), 1);
    assert!(cache.lookup("main.tf", b"resource").is_none());
}

// ============= Retention Tests =============

#[tokio::test]
async fn test_retention_only_when_configured() {
    let stale = (Utc::now() - Duration::days(9)).to_rfc3339();
    let fresh = (Utc::now() - Duration::days(1)).to_rfc3339();
    let blob = document(vec![
        ("stale.tf", "a", stale),
        ("fresh.tf", "b", fresh),
        ("garbled.tf", "c", "last tuesday".to_string()),
    ]);

    let unbounded =
        ContentAddressedCache::load(None, boxed(&MemoryRemoteStore::with_blob(&blob)), None).await;
    assert_eq!(unbounded.len(), 3);

    let bounded = ContentAddressedCache::load(
        None,
        boxed(&MemoryRemoteStore::with_blob(&blob)),
        Some(Duration::days(7)),
    )
    .await;
    assert_eq!(bounded.len(), 1);
    assert!(bounded.get("fresh.tf").is_some());
}

#[tokio::test]
async fn test_dirty_cache_flushes_on_drop() {
    let temp_dir = TempDir::new().unwrap();
    let local_path = temp_dir.path().join("cache.json");

    {
        let mut cache =
            ContentAddressedCache::load(Some(LocalCacheFile::new(&local_path)), None, None).await;
        cache.store("app.py", "digest", result_with_issue("app.py"));
    }

    let cache = ContentAddressedCache::load(Some(LocalCacheFile::new(&local_path)), None, None).await;
    assert_eq!(cache.get("app.py").unwrap().result, Some(result_with_issue("app.py")));
}
