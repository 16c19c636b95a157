use super::issue::Severity;
use serde::{Deserialize, Serialize};

/// A published advisory matching a pinned dependency
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VulnerabilityFinding {
    pub id: String,
    pub package: String,
    pub version: String,
    pub ecosystem: String,
    #[serde(default)]
    pub summary: String,
    pub severity: Severity,
    /// Manifest path relative to the scan root
    pub manifest: String,
}
