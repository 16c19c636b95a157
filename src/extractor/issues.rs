//! Lenient conversion of model-supplied JSON into issues
//!
//! An entry must carry `line` and `severity`; everything else is optional.
//! Unknown severities become medium and lines below 1 clamp to 1.

use crate::models::{Issue, Severity};
use serde_json::Value;
use std::collections::BTreeSet;

pub fn parse_issue(value: &Value) -> Option<Issue> {
    let obj = value.as_object()?;

    let line = number(obj.get("line")?)?;
    let severity_value = obj.get("severity")?;
    let severity = severity_value
        .as_str()
        .and_then(Severity::from_str)
        .unwrap_or(Severity::Medium);

    let text = |key: &str| obj.get(key).and_then(Value::as_str).map(|s| s.trim().to_string());

    let line = if line < 1.0 { 1 } else { line.min(u32::MAX as f64) as u32 };
    let mut issue = Issue::new(
        line,
        severity,
        &text("category").unwrap_or_else(|| "general".to_string()),
        &text("description").unwrap_or_default(),
    );
    issue.remediation = text("remediation").filter(|r| !r.is_empty());
    issue.cvss = obj.get("cvss").and_then(number);
    issue.compliance_violations = obj
        .get("compliance_violations")
        .map(string_set)
        .unwrap_or_default();

    Some(issue)
}

/// Every well-formed issue in a JSON array; anything else yields nothing
pub fn parse_issue_list(value: &Value) -> Vec<Issue> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(parse_issue).collect())
        .unwrap_or_default()
}

/// Non-empty strings from a JSON array
pub fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn string_set(value: &Value) -> BTreeSet<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => BTreeSet::from([s.trim().to_string()]),
        _ => string_list(value).into_iter().collect(),
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_issue() {
        let issue = parse_issue(&json!({
            "line": 12,
            "severity": "critical",
            "category": "network",
            "description": "Ingress open to world",
            "cvss": 9.1,
            "compliance_violations": ["PCI-DSS", "SOC2", "PCI-DSS"],
            "remediation": "Restrict CIDR"
        }))
        .unwrap();

        assert_eq!(issue.line, 12);
        assert_eq!(issue.severity, Severity::Critical);
        assert_eq!(issue.category, "network");
        assert_eq!(issue.cvss, Some(9.1));
        assert_eq!(issue.compliance_violations.len(), 2);
        assert_eq!(issue.remediation.as_deref(), Some("Restrict CIDR"));
    }

    #[test]
    fn test_missing_line_or_severity_is_dropped() {
        assert!(parse_issue(&json!({"severity": "high"})).is_none());
        assert!(parse_issue(&json!({"line": 3})).is_none());
        assert!(parse_issue(&json!("not an object")).is_none());
    }

    #[test]
    fn test_unknown_severity_maps_to_medium() {
        let issue = parse_issue(&json!({"line": 1, "severity": "urgent"})).unwrap();
        assert_eq!(issue.severity, Severity::Medium);

        let numeric = parse_issue(&json!({"line": 1, "severity": 5})).unwrap();
        assert_eq!(numeric.severity, Severity::Medium);
    }

    #[test]
    fn test_line_clamps_and_accepts_strings() {
        assert_eq!(parse_issue(&json!({"line": 0, "severity": "low"})).unwrap().line, 1);
        assert_eq!(parse_issue(&json!({"line": -4, "severity": "low"})).unwrap().line, 1);
        assert_eq!(parse_issue(&json!({"line": "17", "severity": "low"})).unwrap().line, 17);
    }

    #[test]
    fn test_single_string_standard() {
        let issue = parse_issue(&json!({
            "line": 2,
            "severity": "high",
            "compliance_violations": "HIPAA"
        }))
        .unwrap();
        assert!(issue.compliance_violations.contains("HIPAA"));
    }

    #[test]
    fn test_parse_issue_list_skips_bad_entries() {
        let issues = parse_issue_list(&json!([
            {"line": 1, "severity": "high"},
            {"description": "no line"},
            {"line": 9, "severity": "LOW"}
        ]));
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[1].severity, Severity::Low);

        assert!(parse_issue_list(&json!({"line": 1})).is_empty());
    }

    #[test]
    fn test_string_list() {
        let changes = string_list(&json!(["Restricted CIDR", "", 4, "  Disabled root  "]));
        assert_eq!(changes, vec!["Restricted CIDR", "Disabled root"]);
    }
}
