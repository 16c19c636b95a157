// complyscan - CI compliance scanner
// Module re-exports

pub mod advisory;
pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod extractor;
pub mod fix;
pub mod models;
pub mod oracle;
pub mod orchestrator;
pub mod scanner;

// Re-export commonly used types
pub use models::{
    CostLedger, Issue, IssueSource, ScanReport, ScanResult, Severity, Standard,
    VulnerabilityFinding,
};

pub use advisory::{AdvisoryFeed, OsvFeed};
pub use cache::{ContentAddressedCache, HttpBlobStore, LocalCacheFile, RemoteStore};
pub use cli::Cli;
pub use config::{ConfigError, ScannerConfig};
pub use context::{HttpKnowledgeBase, KnowledgeBase, RuleContextProvider, StaticKnowledgeBase};
pub use extractor::{Extraction, ResultExtractor};
pub use fix::{FixApplicator, FixError};
pub use oracle::{Oracle, OracleClient};
pub use orchestrator::{ScanOptions, ScanOrchestrator};
pub use scanner::{FileClassifier, Language};
