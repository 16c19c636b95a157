use super::issue::{Issue, Severity};
use crate::scanner::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which step of the extraction chain produced a result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    DirectJson,
    FieldRegex,
    MarkerBlock,
    Substitution,
    NoOp,
}

impl ExtractionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStrategy::DirectJson => "direct_json",
            ExtractionStrategy::FieldRegex => "field_regex",
            ExtractionStrategy::MarkerBlock => "marker_block",
            ExtractionStrategy::Substitution => "substitution",
            ExtractionStrategy::NoOp => "no_op",
        }
    }

    /// Strategies whose candidate text came from the oracle rather than the fixed table
    pub fn is_oracle_sourced(&self) -> bool {
        matches!(
            self,
            ExtractionStrategy::DirectJson
                | ExtractionStrategy::FieldRegex
                | ExtractionStrategy::MarkerBlock
        )
    }
}

/// Outcome of scanning one file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanResult {
    pub filepath: String,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub compliance_violations: BTreeSet<String>,
    #[serde(default)]
    pub changes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ExtractionStrategy>,
    /// Findings still detected in the content written by a fix
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remaining_issues: Vec<Issue>,
}

impl ScanResult {
    pub fn new(filepath: &str, language: Language, framework: Option<String>) -> Self {
        Self {
            filepath: filepath.to_string(),
            language,
            framework,
            issues: Vec::new(),
            fixed: false,
            compliance_violations: BTreeSet::new(),
            changes: Vec::new(),
            strategy: None,
            remaining_issues: Vec::new(),
        }
    }

    /// Replaces the issue list and recomputes the file-level standard set
    pub fn with_issues(mut self, issues: Vec<Issue>) -> Self {
        self.compliance_violations = issues
            .iter()
            .flat_map(|i| i.compliance_violations.iter().cloned())
            .collect();
        self.issues = issues;
        self
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// True when the file still carries findings that no fix has addressed
    pub fn has_unfixed_issues(&self) -> bool {
        !self.unfixed_issues().is_empty()
    }

    pub fn unfixed_critical_count(&self) -> usize {
        self.unfixed_issues()
            .iter()
            .filter(|i| i.severity == Severity::Critical)
            .count()
    }

    /// A fixed file answers for what its fix left behind, otherwise for everything
    fn unfixed_issues(&self) -> &[Issue] {
        if self.fixed {
            &self.remaining_issues
        } else {
            &self.issues
        }
    }
}
