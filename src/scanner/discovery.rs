//! Candidate file discovery
//!
//! Walks the scan root, prunes vendored and hidden directories, and keeps files
//! whose language is known and whose size is under the ceiling.

use super::classifier::{FileClassifier, Language};
use super::constants::{MANIFEST_FILES, SKIP_DIRECTORIES};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// A file selected for the scan pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFile {
    pub path: PathBuf,
    /// Forward-slash path relative to the scan root; used as the cache key
    pub relative: String,
    pub language: Language,
}

#[derive(Debug, Clone, Copy)]
pub struct DiscoveryOptions {
    pub max_file_bytes: u64,
    pub max_files: usize,
}

/// Collect candidate files under `root`, sorted by relative path
///
/// Unknown extensions are excluded, oversized files are skipped, and the list is
/// truncated to `max_files`.
pub fn discover(root: &Path, options: DiscoveryOptions) -> Vec<CandidateFile> {
    let mut candidates: Vec<CandidateFile> = walk_files(root)
        .filter_map(|entry| {
            let language = FileClassifier::detect_language(entry.path());
            if !language.is_known() {
                return None;
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(u64::MAX);
            if size > options.max_file_bytes {
                debug!(path = %entry.path().display(), size, "skipping oversized file");
                return None;
            }

            Some(CandidateFile {
                relative: relative_path(root, entry.path()),
                path: entry.path().to_path_buf(),
                language,
            })
        })
        .collect();

    candidates.sort_by(|a, b| a.relative.cmp(&b.relative));
    if candidates.len() > options.max_files {
        debug!(
            found = candidates.len(),
            limit = options.max_files,
            "truncating candidate list"
        );
        candidates.truncate(options.max_files);
    }
    candidates
}

/// Dependency manifests under `root`, sorted by path
pub fn discover_manifests(root: &Path) -> Vec<PathBuf> {
    let mut manifests: Vec<PathBuf> = walk_files(root)
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| MANIFEST_FILES.contains(&name))
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();
    manifests.sort();
    manifests
}

pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn walk_files(root: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !should_skip_entry(entry))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
}

fn should_skip_entry(entry: &DirEntry) -> bool {
    let Some(name) = entry.file_name().to_str() else {
        return true;
    };

    if entry.file_type().is_dir() {
        SKIP_DIRECTORIES.contains(&name) || name.starts_with('.')
    } else {
        false
    }
}
