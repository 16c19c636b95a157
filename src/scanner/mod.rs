//! File selection and cheap pre-analysis
//!
//! Provides discovery of candidate files, language/framework classification and
//! deterministic static checks.

pub mod classifier;
pub mod constants;
pub mod discovery;
pub mod static_checks;

pub use classifier::{FileClassifier, Language};
pub use constants::SKIP_DIRECTORIES;
pub use discovery::{discover, discover_manifests, CandidateFile, DiscoveryOptions};
pub use static_checks::run_static_checks;
