//! Acceptance gate for candidate fixes

use crate::scanner::Language;
use std::fmt;

pub const MIN_FIX_LENGTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    Unchanged,
    TooShort,
    MissingStructure,
    NoChanges,
}

impl fmt::Display for GateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            GateRejection::Unchanged => "candidate is identical to the original",
            GateRejection::TooShort => "candidate is shorter than the minimum fix length",
            GateRejection::MissingStructure => "candidate lacks a top-level keyword for its file type",
            GateRejection::NoChanges => "candidate has no change descriptions",
        };
        f.write_str(reason)
    }
}

/// Checks a candidate must pass before it may replace a file
#[derive(Debug, Clone, Copy)]
pub struct AcceptanceGate {
    pub min_length: usize,
}

impl Default for AcceptanceGate {
    fn default() -> Self {
        Self {
            min_length: MIN_FIX_LENGTH,
        }
    }
}

impl AcceptanceGate {
    /// Full gate for text that came from the oracle
    ///
    /// # Errors
    /// Returns the first failed check, in order: unchanged, too short,
    /// missing structure, no changes
    pub fn check_oracle_candidate(
        &self,
        candidate: &str,
        original: &str,
        language: Language,
        changes: &[String],
    ) -> Result<(), GateRejection> {
        if candidate == original {
            return Err(GateRejection::Unchanged);
        }
        if candidate.chars().count() < self.min_length {
            return Err(GateRejection::TooShort);
        }
        if !has_structure(candidate, language) {
            return Err(GateRejection::MissingStructure);
        }
        if changes.is_empty() {
            return Err(GateRejection::NoChanges);
        }
        Ok(())
    }

    /// Reduced gate for table substitutions on the original content
    pub fn check_substitution(
        &self,
        candidate: &str,
        original: &str,
        changes: &[String],
    ) -> Result<(), GateRejection> {
        if candidate == original {
            return Err(GateRejection::Unchanged);
        }
        if changes.is_empty() {
            return Err(GateRejection::NoChanges);
        }
        Ok(())
    }
}

/// True when some line starts with a top-level keyword for the language
///
/// Languages without keywords always pass.
pub fn has_structure(candidate: &str, language: Language) -> bool {
    let keywords = language.structural_keywords();
    if keywords.is_empty() {
        return true;
    }
    candidate.lines().any(|line| {
        let line = line.trim_start();
        keywords.iter().any(|k| line.starts_with(k))
    })
}
