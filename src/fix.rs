//! Writing accepted fixes back to disk
//!
//! Every write goes backup → write → verify → drop backup. If the write or the
//! verification fails, the original bytes are restored from the backup. Paths
//! are resolved against the scan root and anything that escapes it is refused.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum FixError {
    #[error("Refusing to write outside the scan root: {0}")]
    OutsideRoot(String),

    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Written content of {0} does not match the fix")]
    VerificationFailed(String),
}

impl FixError {
    fn io(path: &Path, source: io::Error) -> Self {
        FixError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Applies fixes to files under one scan root
pub struct FixApplicator {
    root: PathBuf,
}

impl FixApplicator {
    /// # Errors
    /// Returns error if the root does not exist or cannot be resolved
    pub fn new(root: &Path) -> Result<Self, FixError> {
        let root = root.canonicalize().map_err(|e| FixError::io(root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Replace the content of `relative_path` with `fixed_content`
    ///
    /// # Arguments
    /// * `relative_path` - Path relative to the scan root
    /// * `fixed_content` - The complete new file content
    ///
    /// # Returns
    /// The resolved path that was written
    ///
    /// # Errors
    /// Returns error if the path escapes the root, or the write fails (in which
    /// case the original content has been restored)
    pub fn apply_fix(&self, relative_path: &str, fixed_content: &str) -> Result<PathBuf, FixError> {
        let path = self.validate_file_path(relative_path)?;

        Self::backup_file(&path)?;
        if let Err(e) = Self::write_and_verify(&path, fixed_content) {
            warn!(path = %path.display(), error = %e, "fix failed, restoring backup");
            Self::restore_from_backup(&path)?;
            return Err(e);
        }
        Self::remove_backup(&path)?;

        debug!(path = %path.display(), bytes = fixed_content.len(), "fix applied");
        Ok(path)
    }

    /// Resolve a relative path and make sure it stays under the root
    ///
    /// This function ensures that:
    /// 1. The path is relative (not absolute)
    /// 2. The path doesn't contain ".." components or null bytes
    /// 3. The resolved path (after symlinks) stays within the root
    pub fn validate_file_path(&self, relative_path: &str) -> Result<PathBuf, FixError> {
        let candidate = Path::new(relative_path);
        if candidate.is_absolute() {
            return Err(FixError::OutsideRoot(relative_path.to_string()));
        }
        if candidate.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(FixError::OutsideRoot(relative_path.to_string()));
        }
        if relative_path.contains('\0') {
            return Err(FixError::InvalidPath {
                path: relative_path.to_string(),
                reason: "null byte in path",
            });
        }

        let full_path = self.root.join(candidate);
        let canonical = full_path
            .canonicalize()
            .map_err(|e| FixError::io(&full_path, e))?;

        if !canonical.starts_with(&self.root) {
            return Err(FixError::OutsideRoot(canonical.display().to_string()));
        }
        if !canonical.is_file() {
            return Err(FixError::InvalidPath {
                path: relative_path.to_string(),
                reason: "not a regular file",
            });
        }

        Ok(canonical)
    }

    fn write_and_verify(path: &Path, content: &str) -> Result<(), FixError> {
        fs::write(path, content).map_err(|e| FixError::io(path, e))?;

        let written = fs::read(path).map_err(|e| FixError::io(path, e))?;
        if written != content.as_bytes() {
            return Err(FixError::VerificationFailed(path.display().to_string()));
        }
        Ok(())
    }

    /// Backup location: `{filename}.bak` in the same directory
    pub fn backup_path(file_path: &Path) -> PathBuf {
        PathBuf::from(format!("{}.bak", file_path.display()))
    }

    /// Copy the file to its backup path, overwriting an old backup
    pub fn backup_file(file_path: &Path) -> Result<(), FixError> {
        let backup_path = Self::backup_path(file_path);
        fs::copy(file_path, &backup_path)
            .map(|_| ())
            .map_err(|e| FixError::io(&backup_path, e))
    }

    /// Copy the backup over the file and remove the backup
    pub fn restore_from_backup(file_path: &Path) -> Result<(), FixError> {
        let backup_path = Self::backup_path(file_path);
        fs::copy(&backup_path, file_path).map_err(|e| FixError::io(file_path, e))?;
        Self::remove_backup(file_path)
    }

    pub fn backup_exists(file_path: &Path) -> bool {
        Self::backup_path(file_path).exists()
    }

    pub fn remove_backup(file_path: &Path) -> Result<(), FixError> {
        let backup_path = Self::backup_path(file_path);
        fs::remove_file(&backup_path).map_err(|e| FixError::io(&backup_path, e))
    }
}
