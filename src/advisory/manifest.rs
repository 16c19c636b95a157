//! Dependency manifest parsing
//!
//! Only pinned versions are extracted. Ranges and tags are skipped since an
//! advisory lookup needs one concrete version.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

pub const PYPI: &str = "PyPI";
pub const NPM: &str = "npm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    pub ecosystem: &'static str,
    /// Manifest path relative to the scan root
    pub manifest: String,
}

/// Dependencies declared in the manifest at `relative`
///
/// # Errors
/// Returns error if a `package.json` is not valid JSON
pub fn parse_manifest(relative: &str, content: &str) -> Result<Vec<Dependency>> {
    let file_name = Path::new(relative)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    match file_name {
        "requirements.txt" => Ok(parse_requirements(relative, content)),
        "package.json" => parse_package_json(relative, content),
        _ => Ok(Vec::new()),
    }
}

/// `name==version` pins from a pip requirements file
pub fn parse_requirements(relative: &str, content: &str) -> Vec<Dependency> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() || line.starts_with('-') {
                return None;
            }
            // Drop environment markers: `pkg==1.0; python_version < "3.8"`
            let line = line.split(';').next().unwrap_or_default();
            let (name, version) = line.split_once("==")?;

            let name = name.split('[').next().unwrap_or_default().trim();
            let version = version.trim();
            if name.is_empty() || version.is_empty() {
                return None;
            }
            Some(Dependency {
                name: name.to_string(),
                version: version.to_string(),
                ecosystem: PYPI,
                manifest: relative.to_string(),
            })
        })
        .collect()
}

/// `dependencies` and `devDependencies` from an npm manifest
///
/// Range prefixes like `^` and `~` are stripped to the base version; entries
/// with no version number (tags, URLs, `*`) are skipped.
pub fn parse_package_json(relative: &str, content: &str) -> Result<Vec<Dependency>> {
    let manifest: Value = serde_json::from_str(content)
        .with_context(|| format!("Failed to parse {}", relative))?;

    let mut dependencies = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        let Some(entries) = manifest.get(section).and_then(|v| v.as_object()) else {
            continue;
        };
        for (name, requirement) in entries {
            let Some(version) = requirement.as_str().and_then(clean_npm_version) else {
                continue;
            };
            dependencies.push(Dependency {
                name: name.clone(),
                version,
                ecosystem: NPM,
                manifest: relative.to_string(),
            });
        }
    }
    Ok(dependencies)
}

fn clean_npm_version(requirement: &str) -> Option<String> {
    if requirement.contains(':') || requirement.contains('/') {
        return None;
    }
    let version = requirement
        .trim()
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .split_whitespace()
        .next()?;
    Some(version.to_string())
}
