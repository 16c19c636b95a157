use crate::config::ScannerConfig;
use crate::models::ScanResult;
use crate::scanner::constants::{DEFAULT_MAX_FILES, DEFAULT_MAX_FILE_BYTES};
use crate::scanner::DiscoveryOptions;
use std::time::Duration;

/// Per-run behavior of the orchestrator
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Write accepted fixes to disk
    pub auto_fix: bool,
    /// Skip a file when its context lookup comes back empty
    pub require_context: bool,
    pub discovery: DiscoveryOptions,
    /// Pause before each advisory lookup
    pub advisory_delay: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            auto_fix: false,
            require_context: false,
            discovery: DiscoveryOptions {
                max_file_bytes: DEFAULT_MAX_FILE_BYTES,
                max_files: DEFAULT_MAX_FILES,
            },
            advisory_delay: Duration::ZERO,
        }
    }
}

impl From<&ScannerConfig> for ScanOptions {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            auto_fix: config.auto_fix,
            require_context: config.require_context,
            discovery: DiscoveryOptions {
                max_file_bytes: config.max_file_bytes,
                max_files: config.max_files,
            },
            advisory_delay: Duration::from_millis(config.advisory_delay_ms),
        }
    }
}

/// Where a file ended up in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    CacheHit,
    AcceptedFix,
    NoChange,
    ContextMissing,
    Unreadable,
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub relative: String,
    pub state: FileState,
    /// Absent for files that never reached the oracle
    pub result: Option<ScanResult>,
}

impl FileOutcome {
    pub fn new(relative: &str, state: FileState, result: ScanResult) -> Self {
        Self {
            relative: relative.to_string(),
            state,
            result: Some(result),
        }
    }

    pub fn unreadable(relative: &str) -> Self {
        Self {
            relative: relative.to_string(),
            state: FileState::Unreadable,
            result: None,
        }
    }

    pub fn context_missing(relative: &str) -> Self {
        Self {
            relative: relative.to_string(),
            state: FileState::ContextMissing,
            result: None,
        }
    }
}
