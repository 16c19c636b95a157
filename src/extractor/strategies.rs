//! Extraction strategies over raw model output
//!
//! Each strategy is a pure function from the same input to an optional
//! candidate. The extractor tries them in order and keeps the first hit.

use super::issues::{parse_issue, parse_issue_list, string_list};
use crate::scanner::Language;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

pub const FIXED_CONTENT_START: &str = "FIXED_CONTENT_START";
pub const FIXED_CONTENT_END: &str = "FIXED_CONTENT_END";

static FIXED_CONTENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)"fixed_content"\s*:\s*"((?:[^"\\]|\\.)*)"#).expect("Invalid regex pattern")
});

static ISSUES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)"issues"\s*:\s*(\[.*?\])\s*,\s*"fixed_content""#).expect("Invalid regex pattern")
});

static CHANGES_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""changes_made"\s*:"#).expect("Invalid regex pattern"));

static CHANGES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)"changes_made"\s*:\s*\[(.*?)\]"#).expect("Invalid regex pattern")
});

static JSON_STRING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).expect("Invalid regex pattern"));

static TERRAFORM_ANCHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*resource\s+"[^"]*"\s+"[^"]*"\s*\{"#).expect("Invalid regex pattern")
});

static KUBERNETES_ANCHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^apiVersion:").expect("Invalid regex pattern"));

static YAML_TOP_LEVEL_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+:(\s|$)").expect("Invalid regex pattern"));

/// What every strategy sees
#[derive(Debug, Clone, Copy)]
pub struct StrategyInput<'a> {
    pub raw: &'a str,
    pub original: &'a str,
    pub language: Language,
}

/// A strategy's proposal, before the acceptance gate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub issues: Vec<crate::models::Issue>,
    pub fixed_content: Option<String>,
    pub changes: Vec<String>,
}

// ============= Strategy 1: direct JSON =============

/// Parse the response as JSON after removing Markdown fences
///
/// Falls back to each balanced top-level object in the raw text, keeping the
/// first that parses and carries `issues` or `fixed_content`.
pub fn direct_json(input: &StrategyInput) -> Option<Candidate> {
    let stripped = strip_fence_lines(input.raw);
    if let Some(span) = outermost_span(&stripped) {
        let whole_response = span.len() == stripped.trim().len();
        if let Some(candidate) = candidate_from_json(span, whole_response) {
            return Some(candidate);
        }
    }

    balanced_objects(input.raw)
        .into_iter()
        .find_map(|object| candidate_from_json(object, false))
}

/// An array counts as an issue list only when it is the whole response or at
/// least one element parses as an issue; arrays quoted in prose fall through.
fn candidate_from_json(text: &str, whole_response: bool) -> Option<Candidate> {
    let value: Value = serde_json::from_str(text).ok()?;
    match value {
        Value::Object(map) => {
            if !map.contains_key("issues") && !map.contains_key("fixed_content") {
                return None;
            }
            Some(Candidate {
                issues: map.get("issues").map(parse_issue_list).unwrap_or_default(),
                fixed_content: map
                    .get("fixed_content")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                changes: map.get("changes_made").map(string_list).unwrap_or_default(),
            })
        }
        Value::Array(items) => {
            let issues: Vec<_> = items.iter().filter_map(parse_issue).collect();
            if issues.is_empty() && !whole_response {
                return None;
            }
            Some(Candidate {
                issues,
                ..Candidate::default()
            })
        }
        _ => None,
    }
}

/// Drop every line that opens or closes a Markdown fence
pub fn strip_fence_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// From the first `{` or `[` through the last matching closer
fn outermost_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Top-level `{...}` spans, skipping braces inside JSON strings
pub fn balanced_objects(text: &str) -> Vec<&str> {
    let mut objects = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            // Quotes in surrounding prose are not JSON strings
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = idx;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    objects.push(&text[start..=idx]);
                }
            }
            _ => {}
        }
    }

    objects
}

// ============= Strategy 2: targeted field regex =============

/// Pull `fixed_content` out of JSON-ish text that does not parse
///
/// Tolerates a missing closing quote from a truncated response. A change
/// description is synthesized only when the response has no `changes_made` key.
pub fn field_regex(input: &StrategyInput) -> Option<Candidate> {
    let captures = FIXED_CONTENT_RE.captures(input.raw)?;
    let fixed_content = unescape_json(captures.get(1)?.as_str());

    let issues = ISSUES_RE
        .captures(input.raw)
        .and_then(|c| c.get(1))
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .map(|v| parse_issue_list(&v))
        .unwrap_or_default();

    let changes = if CHANGES_KEY_RE.is_match(input.raw) {
        CHANGES_RE
            .captures(input.raw)
            .and_then(|c| c.get(1))
            .map(|m| {
                JSON_STRING_RE
                    .captures_iter(m.as_str())
                    .filter_map(|c| c.get(1))
                    .map(|s| unescape_json(s.as_str()).trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    } else {
        vec!["Applied fixed content recovered from a malformed model response".to_string()]
    };

    Some(Candidate {
        issues,
        fixed_content: Some(fixed_content),
        changes,
    })
}

/// Undo JSON string escapes, leaving unknown sequences as written
pub fn unescape_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

// ============= Strategy 3: marker block =============

/// Take the file body between explicit markers, or from a structural anchor
///
/// Markers win over anchors. The end marker is optional, and surrounding fence
/// lines are removed.
pub fn marker_block(input: &StrategyInput) -> Option<Candidate> {
    let body = between_markers(input.raw).or_else(|| from_anchor(input.raw, input.language))?;
    let body = trim_fence_edges(body)?;

    Some(Candidate {
        issues: Vec::new(),
        fixed_content: Some(body),
        changes: vec!["Replaced file content with the delimited block from the model response".to_string()],
    })
}

fn between_markers(raw: &str) -> Option<&str> {
    let after_start = raw.find(FIXED_CONTENT_START)? + FIXED_CONTENT_START.len();
    let rest = &raw[after_start..];
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => "",
    };
    match rest.find(FIXED_CONTENT_END) {
        Some(end) => Some(&rest[..end]),
        None => Some(rest),
    }
}

/// From the anchor through the last line that still belongs to the file
fn from_anchor(raw: &str, language: Language) -> Option<&str> {
    let anchor = match language {
        Language::Terraform => &*TERRAFORM_ANCHOR_RE,
        Language::Kubernetes => &*KUBERNETES_ANCHOR_RE,
        _ => return None,
    };
    let found = anchor.find(raw)?;
    let body = &raw[found.start()..];
    let end = match language {
        Language::Terraform => terraform_body_end(body),
        _ => yaml_body_end(body),
    };
    Some(&body[..end])
}

/// Up to and including the last top-level closing brace
fn terraform_body_end(body: &str) -> usize {
    let mut offset = 0;
    let mut end = body.len();
    for line in body.split_inclusive('\n') {
        offset += line.len();
        if line.starts_with('}') {
            end = offset;
        }
    }
    end
}

/// Up to the first top-level line that is not YAML (prose, a closing fence)
fn yaml_body_end(body: &str) -> usize {
    let mut offset = 0;
    for (idx, line) in body.split_inclusive('\n').enumerate() {
        let text = line.trim_end();
        let is_yaml = idx == 0
            || text.is_empty()
            || line.starts_with([' ', '\t'])
            || text.starts_with('#')
            || text.starts_with("- ")
            || text == "---"
            || YAML_TOP_LEVEL_KEY_RE.is_match(text);
        if !is_yaml {
            return offset;
        }
        offset += line.len();
    }
    body.len()
}

/// Drop blank and fence lines at both ends; `None` if nothing remains
fn trim_fence_edges(body: &str) -> Option<String> {
    let is_edge = |line: &&str| line.trim().is_empty() || line.trim_start().starts_with("```");
    let lines: Vec<&str> = body.lines().collect();

    let start = lines.iter().position(|l| !is_edge(l))?;
    let end = lines.iter().rposition(|l| !is_edge(l))?;

    let mut kept = lines[start..=end].join("\n");
    kept.push('\n');
    Some(kept)
}
