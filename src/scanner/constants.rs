//! Scanner constants
//!
//! Centralized limits and directory lists used by discovery and the classifier

/// Directories never walked during discovery
///
/// Vendored dependencies, build outputs and tool caches hold code the project
/// does not own; sending them to the oracle burns budget on noise.
pub const SKIP_DIRECTORIES: &[&str] = &[
    // Dependencies
    "node_modules",
    "vendor",
    "bower_components",

    // Bundled/static assets
    "assets",
    "public",
    "static",

    // Version control
    ".git",

    // Python virtual environments and caches
    "venv",
    ".venv",
    "__pycache__",
    ".pytest_cache",
    ".tox",

    // Build outputs
    "dist",
    "build",
    "out",
    "target",

    // Infrastructure tool state
    ".terraform",

    // Package manager and tooling
    ".cargo",
    ".next",
    ".cache",
    "coverage",
];

/// Dependency manifests handed to the advisory feed
pub const MANIFEST_FILES: &[&str] = &["requirements.txt", "package.json"];

/// Files above this size are skipped rather than sent to the oracle
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024;

/// Per-run cap on files sent through the pipeline
pub const DEFAULT_MAX_FILES: usize = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_directories_contains_common_dirs() {
        assert!(SKIP_DIRECTORIES.contains(&"node_modules"));
        assert!(SKIP_DIRECTORIES.contains(&".git"));
        assert!(SKIP_DIRECTORIES.contains(&".terraform"));
        assert!(SKIP_DIRECTORIES.contains(&"venv"));
    }

    #[test]
    fn test_manifest_files() {
        assert_eq!(MANIFEST_FILES, &["requirements.txt", "package.json"]);
    }
}
