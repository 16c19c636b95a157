use super::cost::CostLedger;
use super::issue::Severity;
use super::scan_result::ScanResult;
use super::vulnerability::VulnerabilityFinding;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

/// Per-standard roll-up: files violating the standard and the issues they carry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StandardSummary {
    pub files: BTreeSet<String>,
    pub issues: usize,
    pub critical: usize,
    pub high: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VulnerabilitySummary {
    pub total: usize,
    pub by_severity: SeverityCounts,
    pub findings: Vec<VulnerabilityFinding>,
}

/// The report artifact written at the end of a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanReport {
    pub scan_date: String,
    pub model: String,
    pub files_scanned: usize,
    pub cache_hits: usize,
    pub context_skipped: usize,
    pub total_issues: usize,
    pub by_severity: SeverityCounts,
    pub compliance_summary: BTreeMap<String, StandardSummary>,
    pub vulnerability_summary: VulnerabilitySummary,
    pub ai_calls: u64,
    pub cost: f64,
    pub fixed: usize,
    pub results: Vec<ScanResult>,
}

impl ScanReport {
    pub fn new(model: &str) -> Self {
        Self {
            scan_date: chrono::Utc::now().to_rfc3339(),
            model: model.to_string(),
            files_scanned: 0,
            cache_hits: 0,
            context_skipped: 0,
            total_issues: 0,
            by_severity: SeverityCounts::default(),
            compliance_summary: BTreeMap::new(),
            vulnerability_summary: VulnerabilitySummary::default(),
            ai_calls: 0,
            cost: 0.0,
            fixed: 0,
            results: Vec::new(),
        }
    }

    /// Folds one file's result into the totals
    ///
    /// Every standard a file violates is charged with all of that file's issues.
    pub fn record_result(&mut self, result: ScanResult, from_cache: bool) {
        self.files_scanned += 1;
        if from_cache {
            self.cache_hits += 1;
        }
        if result.fixed {
            self.fixed += 1;
        }

        self.total_issues += result.issues.len();
        for issue in &result.issues {
            self.by_severity.add(issue.severity);
        }

        let critical = result.count_by_severity(Severity::Critical);
        let high = result.count_by_severity(Severity::High);
        for standard in &result.compliance_violations {
            let summary = self.compliance_summary.entry(standard.clone()).or_default();
            summary.files.insert(result.filepath.clone());
            summary.issues += result.issues.len();
            summary.critical += critical;
            summary.high += high;
        }

        self.results.push(result);
    }

    /// A file whose mandatory context lookup came back empty
    pub fn record_context_skip(&mut self) {
        self.files_scanned += 1;
        self.context_skipped += 1;
    }

    pub fn record_vulnerabilities(&mut self, findings: Vec<VulnerabilityFinding>) {
        for finding in findings {
            self.vulnerability_summary.total += 1;
            self.vulnerability_summary.by_severity.add(finding.severity);
            self.vulnerability_summary.findings.push(finding);
        }
    }

    pub fn finish(&mut self, ledger: CostLedger) {
        self.ai_calls = ledger.calls;
        self.cost = ledger.accumulated_cost;
    }

    pub fn unfixed_critical(&self) -> usize {
        self.results.iter().map(|r| r.unfixed_critical_count()).sum()
    }

    /// 1 only when a blocking CI run without auto-fix leaves critical issues behind
    pub fn exit_code(&self, ci_blocking: bool, auto_fix: bool) -> i32 {
        if ci_blocking && !auto_fix && self.unfixed_critical() > 0 {
            1
        } else {
            0
        }
    }

    /// Writes the report as pretty-printed JSON
    ///
    /// # Errors
    /// Returns an error if serialization or the file write fails
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize scan report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }
}
