// complyscan data models

pub mod cost;
pub mod issue;
pub mod report;
pub mod scan_result;
pub mod standard;
pub mod vulnerability;

// Re-exports for convenience
pub use cost::{CostLedger, ModelPricing};
pub use issue::{Issue, IssueSource, Severity};
pub use report::{ScanReport, SeverityCounts, StandardSummary, VulnerabilitySummary};
pub use scan_result::{ExtractionStrategy, ScanResult};
pub use standard::Standard;
pub use vulnerability::VulnerabilityFinding;
