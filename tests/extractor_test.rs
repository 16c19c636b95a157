//! Integration tests for result extraction, classification and chunking
//!
//! Exercises the public surface the orchestrator relies on:
//! - Strategy ordering across mixed responses
//! - Gate rejections keep the original content
//! - Unmapped extensions never become candidates
//! - Oversized context queries are chunked and capped

mod common;

use common::{FakeKnowledge, TestProject, OPEN_SECURITY_GROUP, PRIVILEGED_POD};
use complyscan::context::{chunk_query, RuleContextProvider};
use complyscan::extractor::ResultExtractor;
use complyscan::models::{ExtractionStrategy, IssueSource, Severity};
use complyscan::scanner::{discover, run_static_checks, DiscoveryOptions, FileClassifier, Language};
use std::path::Path;
use std::sync::atomic::Ordering;

fn fixed_group() -> String {
    OPEN_SECURITY_GROUP.replace("0.0.0.0/0", "10.20.0.0/16")
}

// ============= Strategy Ordering Tests =============

#[test]
fn test_prose_response_substitutes_known_literal() {
    let extraction = ResultExtractor::new().extract(
        "The ingress rule is open to the internet. You should restrict it.",
        "main.tf",
        OPEN_SECURITY_GROUP,
    );

    assert_eq!(extraction.strategy, ExtractionStrategy::Substitution);
    assert!(extraction.fixed_content.contains("10.0.0.0/8"));
    assert!(!extraction.fixed_content.contains("0.0.0.0/0"));
    assert!(!extraction.changes.is_empty());
    assert!(extraction.issues.iter().all(|i| i.severity == Severity::Critical));
}

#[test]
fn test_prose_quoting_json_array_still_substitutes() {
    let extraction = ResultExtractor::new().extract(
        "Line 9 sets cidr_blocks = [\"0.0.0.0/0\"], which allows all inbound traffic. Restrict it to [\"10.0.0.0/8\"].",
        "main.tf",
        OPEN_SECURITY_GROUP,
    );

    assert_eq!(extraction.strategy, ExtractionStrategy::Substitution);
    assert!(extraction.accepted);
    assert_eq!(extraction.fixed_content, OPEN_SECURITY_GROUP.replace("0.0.0.0/0", "10.0.0.0/8"));
}

#[test]
fn test_substitution_covers_spacing_variants() {
    let original = PRIVILEGED_POD
        .replace("privileged: true", "privileged:  true")
        .replace("runAsUser: 0", "runAsUser:\t0");
    let extraction = ResultExtractor::new().extract("The pod is privileged.", "pod.yaml", &original);

    assert_eq!(extraction.strategy, ExtractionStrategy::Substitution);
    assert!(extraction.fixed_content.contains("privileged:  false"));
    assert!(extraction.fixed_content.contains("runAsUser:\t1000"));
    assert!(run_static_checks(&extraction.fixed_content).is_empty());
    assert_eq!(extraction.changes.len(), 2);
}

#[test]
fn test_json_after_chatter_is_found() {
    let raw = format!(
        "Sure! Here is my analysis.\n\n{}\n\nLet me know if you need anything else.",
        serde_json::json!({
            "issues": [{"line": 9, "severity": "CRITICAL", "category": "network", "description": "open", "compliance_violations": ["PCI-DSS", "PCI-DSS", "SOC2"]}],
            "fixed_content": fixed_group(),
            "changes_made": ["Narrowed ingress CIDR"],
        })
    );
    let extraction = ResultExtractor::new().extract(&raw, "main.tf", OPEN_SECURITY_GROUP);

    assert_eq!(extraction.strategy, ExtractionStrategy::DirectJson);
    assert!(extraction.accepted);
    assert_eq!(extraction.fixed_content, fixed_group());
    assert_eq!(extraction.issues[0].compliance_violations.len(), 2);
}

#[test]
fn test_marker_block_in_markdown_fence() {
    let raw = format!(
        "Fixed version:\nFIXED_CONTENT_START\n```hcl\n{}```\nFIXED_CONTENT_END\n",
        fixed_group()
    );
    let extraction = ResultExtractor::new().extract(&raw, "main.tf", OPEN_SECURITY_GROUP);

    assert_eq!(extraction.strategy, ExtractionStrategy::MarkerBlock);
    assert!(extraction.accepted);
    assert_eq!(extraction.fixed_content, fixed_group());
}

#[test]
fn test_kubernetes_anchor_without_markers() {
    let fixed = PRIVILEGED_POD
        .replace("privileged: true", "privileged: false")
        .replace("runAsUser: 0", "runAsUser: 10001");
    let raw = format!("The container is privileged. Corrected manifest:\n\n{}", fixed);
    let extraction = ResultExtractor::new().extract(&raw, "pod.yaml", PRIVILEGED_POD);

    assert_eq!(extraction.strategy, ExtractionStrategy::MarkerBlock);
    assert!(extraction.fixed_content.starts_with("apiVersion: v1"));
    assert!(extraction.fixed_content.contains("runAsUser: 10001"));
}

// ============= Gate Tests =============

#[test]
fn test_empty_changes_keep_original() {
    let raw = serde_json::json!({
        "fixed_content": fixed_group(),
        "changes_made": [],
    })
    .to_string();
    let extraction = ResultExtractor::new().extract(&raw, "main.tf", OPEN_SECURITY_GROUP);

    assert!(!extraction.accepted);
    assert_eq!(extraction.fixed_content, OPEN_SECURITY_GROUP);
    assert!(extraction.changes.is_empty());
}

#[test]
fn test_truncated_fix_is_rejected() {
    let raw = r#"{"issues": [{"line": 9, "severity": "critical"}], "fixed_content": "resource \"aws", "changes_made": ["x"]}"#;
    let extraction = ResultExtractor::new().extract(raw, "main.tf", OPEN_SECURITY_GROUP);

    assert!(!extraction.accepted);
    assert_eq!(extraction.fixed_content, OPEN_SECURITY_GROUP);
    assert_eq!(extraction.issues.len(), 1);
}

#[test]
fn test_clean_file_is_a_no_op() {
    let original = "package main\n\nfunc main() {}\n";
    let extraction = ResultExtractor::new().extract("", "main.go", original);

    assert_eq!(extraction.strategy, ExtractionStrategy::NoOp);
    assert_eq!(extraction.fixed_content, original);
    assert!(extraction.issues.is_empty());
}

// ============= Classification Tests =============

#[test]
fn test_classification_table() {
    let cases = [
        ("app.py", Language::Python),
        ("server.js", Language::JavaScript),
        ("index.ts", Language::TypeScript),
        ("main.tf", Language::Terraform),
        ("prod.tfvars", Language::Terraform),
        ("deploy.yaml", Language::Kubernetes),
        ("svc.yml", Language::Kubernetes),
        ("App.java", Language::Java),
        ("main.go", Language::Go),
        ("build.sh", Language::Shell),
        ("Dockerfile", Language::Dockerfile),
        ("firmware.bin", Language::Unknown),
    ];
    for (name, expected) in cases {
        assert_eq!(FileClassifier::detect_language(Path::new(name)), expected, "{}", name);
    }
}

#[test]
fn test_framework_detection() {
    let (language, framework) =
        FileClassifier::classify(Path::new("app.py"), "from flask import Flask\napp = Flask(__name__)\n");
    assert_eq!(language, Language::Python);
    assert_eq!(framework.as_deref(), Some("flask"));
}

#[test]
fn test_unmapped_extension_is_not_a_candidate() {
    let project = TestProject::new(vec![
        ("blob.bin", "0.0.0.0/0"),
        ("infra/main.tf", OPEN_SECURITY_GROUP),
    ]);
    let candidates = discover(
        project.path(),
        DiscoveryOptions {
            max_file_bytes: 10 * 1024,
            max_files: 10,
        },
    );

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].relative, "infra/main.tf");
    assert!(candidates.iter().all(|c| !c.relative.ends_with(".bin")));
}

// ============= Static Check Tests =============

#[test]
fn test_static_checks_report_line_numbers() {
    let issues = run_static_checks(PRIVILEGED_POD);
    let lines: Vec<u32> = issues.iter().map(|i| i.line).collect();

    assert_eq!(lines, vec![10, 11]);
    assert!(issues.iter().all(|i| i.source == IssueSource::Static));
}

// ============= Chunking Tests =============

#[test]
fn test_long_query_is_chunked_and_capped() {
    let query: String = (0..400)
        .map(|i| format!("line {:04} of a long compliance query\n", i))
        .collect();
    let ceiling = 1_000;

    let chunks = chunk_query(&query, ceiling, 3);
    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|c| c.chars().count() <= ceiling));
    assert!(chunks.iter().all(|c| c.ends_with('\n')));

    let uncapped = chunk_query(&query, ceiling, 100);
    assert!(uncapped.len() >= 2);
    assert_eq!(uncapped.concat(), query);
}

#[tokio::test]
async fn test_provider_queries_each_chunk() {
    let knowledge = FakeKnowledge::answering("Rotate credentials every 90 days.");
    let lookups = knowledge.call_counter();
    let provider = RuleContextProvider::new(Box::new(knowledge)).with_limits(500, 2);
    let query = "x".repeat(1_800);

    let context = provider.fetch(&query).await.unwrap();

    assert_eq!(lookups.load(Ordering::SeqCst), 2);
    assert!(context.contains("--- context chunk 1/2 ---"));
    assert!(context.contains("--- context chunk 2/2 ---"));
}
