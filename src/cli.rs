use crate::advisory::DEFAULT_OSV_ENDPOINT;
use crate::config::ScannerConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "complyscan",
    version,
    about = "Compliance scanner for CI pipelines",
    long_about = "complyscan asks a hosted model to find PCI-DSS, SOC2, HIPAA, GDPR and OWASP violations \
                  in infrastructure and application code, caches results by content hash, and can write \
                  fixes back to the repository."
)]
pub struct Cli {
    /// Directory to scan
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Write accepted fixes back to disk
    #[arg(long)]
    pub fix: bool,

    /// Exit with status 1 when unfixed critical issues remain
    #[arg(long)]
    pub ci: bool,

    /// Report output path
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Local cache file
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Shared cache object URL (HTTP GET/PUT)
    #[arg(long)]
    pub remote_cache: Option<String>,

    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum number of files scanned per run
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Skip files larger than this many bytes
    #[arg(long)]
    pub max_file_bytes: Option<u64>,

    /// Skip files whose compliance context lookup returns nothing
    #[arg(long)]
    pub require_context: bool,

    /// Knowledge base retrieval endpoint
    #[arg(long)]
    pub knowledge_endpoint: Option<String>,

    /// Check pinned dependencies against the public OSV database
    #[arg(long)]
    pub advisories: bool,
}

impl Cli {
    /// Layer command-line overrides on top of the environment configuration
    pub fn apply(&self, config: &mut ScannerConfig) {
        if self.fix {
            config.auto_fix = true;
        }
        if self.ci {
            config.ci_blocking = true;
        }
        if self.require_context {
            config.require_context = true;
        }
        if let Some(report) = &self.report {
            config.report_path = report.clone();
        }
        if let Some(cache) = &self.cache {
            config.cache_path = cache.clone();
        }
        if let Some(url) = &self.remote_cache {
            config.remote_cache_url = Some(url.clone());
        }
        if let Some(model) = &self.model {
            config.model_id = model.clone();
        }
        if let Some(max_files) = self.max_files {
            config.max_files = max_files;
        }
        if let Some(max_file_bytes) = self.max_file_bytes {
            config.max_file_bytes = max_file_bytes;
        }
        if let Some(endpoint) = &self.knowledge_endpoint {
            config.knowledge_endpoint = Some(endpoint.clone());
        }
        if self.advisories && config.advisory_endpoint.is_none() {
            config.advisory_endpoint = Some(DEFAULT_OSV_ENDPOINT.to_string());
        }
    }
}
