//! Deterministic fixes applied to the original content
//!
//! Used when the model produced nothing structured. Only the settings in
//! `SUBSTITUTIONS` are ever rewritten; every other byte is left untouched.
//! Triggers share their patterns with the static checks, so anything those
//! checks flag as critical can be rewritten here.

use super::strategies::{Candidate, StrategyInput};
use crate::models::{Issue, Severity};
use crate::scanner::static_checks::{OPEN_CIDR_PATTERN, PRIVILEGED_PATTERN, ROOT_UID_PATTERN};
use once_cell::sync::Lazy;
use regex::Regex;

pub struct Substitution {
    pub trigger: Regex,
    /// Replacement template; `${1}` is the matched key with its spacing
    pub replacement: &'static str,
    pub description: &'static str,
    pub remediation: &'static str,
    pub category: &'static str,
    pub standards: &'static [&'static str],
}

pub static SUBSTITUTIONS: Lazy<Vec<Substitution>> = Lazy::new(|| {
    vec![
        Substitution {
            trigger: Regex::new(OPEN_CIDR_PATTERN).expect("Invalid regex pattern"),
            replacement: "10.0.0.0/8",
            description: "Restricted world-open CIDR to the private 10.0.0.0/8 range",
            remediation: "Replace '0.0.0.0/0' with '10.0.0.0/8'",
            category: "network_exposure",
            standards: &["PCI-DSS", "SOC2"],
        },
        Substitution {
            trigger: Regex::new(PRIVILEGED_PATTERN).expect("Invalid regex pattern"),
            replacement: "${1}false",
            description: "Disabled privileged container mode",
            remediation: "Replace 'privileged: true' with 'privileged: false'",
            category: "container_security",
            standards: &["SOC2", "OWASP"],
        },
        Substitution {
            trigger: Regex::new(ROOT_UID_PATTERN).expect("Invalid regex pattern"),
            replacement: "${1}1000",
            description: "Switched container from root to uid 1000",
            remediation: "Replace 'runAsUser: 0' with 'runAsUser: 1000'",
            category: "container_security",
            standards: &["SOC2", "OWASP"],
        },
    ]
});

/// Rewrite every trigger in the original content
///
/// # Returns
/// `None` when no trigger occurs; otherwise the rewritten content, one change
/// line per trigger and one critical issue per affected line
pub fn substitution(input: &StrategyInput) -> Option<Candidate> {
    let mut content = input.original.to_string();
    let mut changes = Vec::new();
    let mut issues = Vec::new();

    for sub in SUBSTITUTIONS.iter() {
        let occurrences = sub.trigger.find_iter(&content).count();
        if occurrences == 0 {
            continue;
        }

        for (idx, line) in input.original.lines().enumerate() {
            if sub.trigger.is_match(line) {
                issues.push(
                    Issue::new((idx + 1) as u32, Severity::Critical, sub.category, sub.description)
                        .with_remediation(sub.remediation)
                        .with_standards(sub.standards.iter().copied())
                        .from_static_check(),
                );
            }
        }

        content = sub.trigger.replace_all(&content, sub.replacement).into_owned();
        changes.push(format!(
            "{} ({} occurrence{})",
            sub.description,
            occurrences,
            if occurrences == 1 { "" } else { "s" }
        ));
    }

    if changes.is_empty() {
        return None;
    }

    issues.sort_by_key(|i| i.line);
    Some(Candidate {
        issues,
        fixed_content: Some(content),
        changes,
    })
}
