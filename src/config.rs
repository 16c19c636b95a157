//! Scanner configuration
//!
//! Every knob is read once at startup from environment variables (after loading
//! an optional `.env` file) and passed down explicitly. CLI flags override
//! individual fields after loading.

use crate::context::{DEFAULT_CONTEXT_CEILING, DEFAULT_MAX_CHUNKS};
use crate::scanner::constants::{DEFAULT_MAX_FILES, DEFAULT_MAX_FILE_BYTES};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-haiku-20240307-v1:0";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MAX_TOKENS: u32 = 3000;
pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_TOP_P: f64 = 0.9;
pub const DEFAULT_RETENTION_DAYS: i64 = 7;
pub const DEFAULT_ADVISORY_DELAY_MS: u64 = 1000;
pub const DEFAULT_CACHE_PATH: &str = ".complyscan-cache.json";
pub const DEFAULT_REPORT_PATH: &str = "compliance_report.json";

/// Fatal configuration problems, reported before any file is scanned
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable not set. Please set it in .env or your environment.")]
    MissingVar(String),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("API key {0}")]
    InvalidApiKey(String),

    #[error("Mandatory context is enabled but no knowledge base is configured")]
    ContextProviderMissing,

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("Scan root {0} is not a readable directory")]
    InvalidRoot(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScannerConfig {
    pub region: String,
    pub model_id: String,
    pub oracle_endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub require_context: bool,
    pub knowledge_endpoint: Option<String>,
    /// Use the bundled standard summaries when no knowledge endpoint is set
    pub builtin_context: bool,
    pub context_ceiling: usize,
    pub max_context_chunks: usize,
    pub max_file_bytes: u64,
    pub max_files: usize,
    /// Age limit for cache records; `None` keeps records forever
    pub retention_days: Option<i64>,
    pub cache_path: PathBuf,
    pub remote_cache_url: Option<String>,
    pub advisory_endpoint: Option<String>,
    pub advisory_delay_ms: u64,
    pub auto_fix: bool,
    pub ci_blocking: bool,
    pub report_path: PathBuf,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            oracle_endpoint: default_endpoint(DEFAULT_REGION),
            api_key: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            require_context: false,
            knowledge_endpoint: None,
            builtin_context: true,
            context_ceiling: DEFAULT_CONTEXT_CEILING,
            max_context_chunks: DEFAULT_MAX_CHUNKS,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_files: DEFAULT_MAX_FILES,
            retention_days: None,
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            remote_cache_url: None,
            advisory_endpoint: None,
            advisory_delay_ms: DEFAULT_ADVISORY_DELAY_MS,
            auto_fix: false,
            ci_blocking: false,
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
        }
    }
}

impl ScannerConfig {
    /// Build the configuration from the process environment
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` for any variable that fails to parse
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let region = get("AWS_REGION").unwrap_or(defaults.region);
        let oracle_endpoint = get("COMPLYSCAN_ORACLE_ENDPOINT").unwrap_or_else(|| default_endpoint(&region));
        let remote_cache_url = get("COMPLYSCAN_REMOTE_CACHE_URL");

        // Shared caches expire old records by default; local caches keep them
        let retention_days = match get("COMPLYSCAN_RETENTION_DAYS") {
            Some(raw) => Some(parse_value("COMPLYSCAN_RETENTION_DAYS", &raw)?),
            None if remote_cache_url.is_some() => Some(DEFAULT_RETENTION_DAYS),
            None => None,
        };

        Ok(Self {
            model_id: get("COMPLYSCAN_MODEL_ID").unwrap_or(defaults.model_id),
            oracle_endpoint,
            region,
            api_key: get("COMPLYSCAN_API_KEY").or_else(|| get("AWS_BEARER_TOKEN_BEDROCK")),
            max_tokens: parse_or(&get, "COMPLYSCAN_MAX_TOKENS", defaults.max_tokens)?,
            temperature: parse_or(&get, "COMPLYSCAN_TEMPERATURE", defaults.temperature)?,
            top_p: parse_or(&get, "COMPLYSCAN_TOP_P", defaults.top_p)?,
            require_context: flag_or(&get, "COMPLYSCAN_REQUIRE_CONTEXT", defaults.require_context)?,
            knowledge_endpoint: get("COMPLYSCAN_KNOWLEDGE_ENDPOINT"),
            builtin_context: flag_or(&get, "COMPLYSCAN_BUILTIN_CONTEXT", defaults.builtin_context)?,
            context_ceiling: parse_or(&get, "COMPLYSCAN_CONTEXT_CEILING", defaults.context_ceiling)?,
            max_context_chunks: parse_or(&get, "COMPLYSCAN_CONTEXT_MAX_CHUNKS", defaults.max_context_chunks)?,
            max_file_bytes: parse_or(&get, "COMPLYSCAN_MAX_FILE_BYTES", defaults.max_file_bytes)?,
            max_files: parse_or(&get, "COMPLYSCAN_MAX_FILES", defaults.max_files)?,
            retention_days,
            cache_path: get("COMPLYSCAN_CACHE_PATH").map(PathBuf::from).unwrap_or(defaults.cache_path),
            remote_cache_url,
            advisory_endpoint: get("COMPLYSCAN_ADVISORY_ENDPOINT"),
            advisory_delay_ms: parse_or(&get, "COMPLYSCAN_ADVISORY_DELAY_MS", defaults.advisory_delay_ms)?,
            auto_fix: flag_or(&get, "COMPLYSCAN_AUTO_FIX", defaults.auto_fix)?,
            ci_blocking: flag_or(&get, "COMPLYSCAN_CI_BLOCKING", defaults.ci_blocking)?,
            report_path: get("COMPLYSCAN_REPORT_PATH").map(PathBuf::from).unwrap_or(defaults.report_path),
        })
    }

    /// Whether any knowledge base will back the context provider
    pub fn has_context_source(&self) -> bool {
        self.knowledge_endpoint.is_some() || self.builtin_context
    }

    /// Checks everything that must hold before the first file is scanned
    ///
    /// # Errors
    /// Returns the first violated constraint
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.require_context && !self.has_context_source() {
            return Err(ConfigError::ContextProviderMissing);
        }
        if self.max_files == 0 {
            return Err(ConfigError::ZeroLimit("max files per run"));
        }
        if self.context_ceiling == 0 {
            return Err(ConfigError::ZeroLimit("context ceiling"));
        }
        if self.max_context_chunks == 0 {
            return Err(ConfigError::ZeroLimit("max context chunks"));
        }
        Ok(())
    }

    /// The API key after format validation
    ///
    /// # Errors
    /// Returns error if the key is absent or fails `validate_api_key`
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("COMPLYSCAN_API_KEY".to_string()))?;
        validate_api_key(key)?;
        Ok(key)
    }
}

/// Load environment variables from .env file
///
/// Does not fail if .env file doesn't exist (optional configuration).
pub fn load_env() {
    dotenv::dotenv().ok();
}

/// Validate API key format
///
/// Checks that API key meets minimum requirements:
/// - Not empty
/// - At least 20 characters long
///
/// # Errors
/// Returns error if key doesn't meet validation requirements
pub fn validate_api_key(key: &str) -> Result<(), ConfigError> {
    if key.is_empty() {
        return Err(ConfigError::InvalidApiKey("cannot be empty".to_string()));
    }
    if key.len() < 20 {
        return Err(ConfigError::InvalidApiKey(format!(
            "appears invalid (too short). Expected >= 20 characters, got {}",
            key.len()
        )));
    }
    Ok(())
}

pub fn default_endpoint(region: &str) -> String {
    format!("https://bedrock-runtime.{}.amazonaws.com", region)
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn flag_or<G>(get: &G, key: &str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        },
        None => Ok(default),
    }
}
