//! Deterministic line-level pre-checks
//!
//! A handful of literals are always wrong in infrastructure and application code:
//! - World-open CIDR ranges (0.0.0.0/0)
//! - Privileged containers and containers running as uid 0
//! - Hardcoded passwords, API keys, secrets and tokens
//!
//! These run before the oracle call and cost nothing. Their issues are tagged
//! with `IssueSource::Static`.

use crate::models::{Issue, Severity};
use once_cell::sync::Lazy;
use regex::Regex;

/// World-open IPv4 range
pub const OPEN_CIDR_PATTERN: &str = r"0\.0\.0\.0/0";
/// Privileged container; group 1 keeps the key and its spacing
pub const PRIVILEGED_PATTERN: &str = r"(?i)(privileged:[ \t]*)true\b";
/// Container running as uid 0; group 1 keeps the key and its spacing
pub const ROOT_UID_PATTERN: &str = r"(?i)(runAsUser:[ \t]*)0\b";

struct StaticRule {
    pattern: Regex,
    severity: Severity,
    category: &'static str,
    description: &'static str,
    remediation: &'static str,
    standards: &'static [&'static str],
}

impl StaticRule {
    fn new(
        pattern: &str,
        severity: Severity,
        category: &'static str,
        description: &'static str,
        remediation: &'static str,
        standards: &'static [&'static str],
    ) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("Invalid regex pattern"),
            severity,
            category,
            description,
            remediation,
            standards,
        }
    }
}

static RULES: Lazy<Vec<StaticRule>> = Lazy::new(|| {
    vec![
        StaticRule::new(
            OPEN_CIDR_PATTERN,
            Severity::Critical,
            "network_exposure",
            "Security group or firewall rule open to the entire internet (0.0.0.0/0)",
            "Restrict the CIDR block to a private or known range",
            &["PCI-DSS", "SOC2"],
        ),
        StaticRule::new(
            PRIVILEGED_PATTERN,
            Severity::Critical,
            "container_security",
            "Container runs in privileged mode",
            "Set privileged: false and grant only the capabilities the workload needs",
            &["SOC2", "OWASP"],
        ),
        StaticRule::new(
            ROOT_UID_PATTERN,
            Severity::Critical,
            "container_security",
            "Container runs as root (runAsUser: 0)",
            "Run as a non-root uid such as 1000 and set runAsNonRoot: true",
            &["SOC2", "OWASP"],
        ),
        StaticRule::new(
            r#"(?i)password\s*[=:]\s*["'][^"']{3,}["']"#,
            Severity::High,
            "hardcoded_credentials",
            "Hardcoded password",
            "Load the password from the environment or a secrets manager",
            &["PCI-DSS", "SOC2", "OWASP"],
        ),
        StaticRule::new(
            r#"(?i)(api_key|apikey|secret|token)\s*[=:]\s*["'][^"']{10,}["']"#,
            Severity::High,
            "hardcoded_credentials",
            "Hardcoded API key, secret or token",
            "Load the credential from the environment or a secrets manager",
            &["PCI-DSS", "SOC2", "OWASP"],
        ),
    ]
});

/// Run every static rule over `content`
///
/// # Returns
/// One issue per (rule, line) match, ordered by line then rule
pub fn run_static_checks(content: &str) -> Vec<Issue> {
    let mut issues = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("//") || trimmed.starts_with('#') {
            continue;
        }

        for rule in RULES.iter() {
            if rule.pattern.is_match(line) {
                issues.push(
                    Issue::new((idx + 1) as u32, rule.severity, rule.category, rule.description)
                        .with_remediation(rule.remediation)
                        .with_standards(rule.standards.iter().copied())
                        .from_static_check(),
                );
            }
        }
    }

    issues
}
