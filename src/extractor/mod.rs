//! Structured results from free-form model output
//!
//! Strategies run in a fixed order and the first one that produces a candidate
//! wins:
//! 1. Direct JSON (fences stripped, then balanced objects)
//! 2. Targeted field regex for malformed or truncated JSON
//! 3. Marker block or structural anchor
//! 4. Deterministic substitution on the original content
//! 5. No-op
//!
//! A winning fix still has to pass the acceptance gate. A rejected fix is
//! replaced by the original content, but the strategy's issues are kept.

pub mod gate;
pub mod issues;
pub mod strategies;
pub mod substitution;

pub use gate::{AcceptanceGate, GateRejection, MIN_FIX_LENGTH};
pub use strategies::{Candidate, StrategyInput};

use crate::models::{ExtractionStrategy, Issue};
use crate::scanner::FileClassifier;
use std::path::Path;
use tracing::{debug, info};

type StrategyFn = fn(&StrategyInput) -> Option<Candidate>;

/// Oracle-sourced strategies, in priority order
const ORACLE_STRATEGIES: &[(ExtractionStrategy, StrategyFn)] = &[
    (ExtractionStrategy::DirectJson, strategies::direct_json),
    (ExtractionStrategy::FieldRegex, strategies::field_regex),
    (ExtractionStrategy::MarkerBlock, strategies::marker_block),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub issues: Vec<Issue>,
    /// The accepted fix, or the original content when nothing was accepted
    pub fixed_content: String,
    /// Empty unless a fix was accepted
    pub changes: Vec<String>,
    pub strategy: ExtractionStrategy,
    pub accepted: bool,
}

impl Extraction {
    fn unchanged(original: &str, issues: Vec<Issue>, strategy: ExtractionStrategy) -> Self {
        Self {
            issues,
            fixed_content: original.to_string(),
            changes: Vec::new(),
            strategy,
            accepted: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResultExtractor {
    gate: AcceptanceGate,
}

impl ResultExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gate(gate: AcceptanceGate) -> Self {
        Self { gate }
    }

    /// Run the strategy chain over one oracle response
    ///
    /// # Arguments
    /// * `raw_text` - The oracle's response, possibly empty
    /// * `filename` - Used to pick the file type for anchors and the gate
    /// * `original_content` - Current file content
    pub fn extract(&self, raw_text: &str, filename: &str, original_content: &str) -> Extraction {
        let input = StrategyInput {
            raw: raw_text,
            original: original_content,
            language: FileClassifier::detect_language(Path::new(filename)),
        };

        if !raw_text.trim().is_empty() {
            for (strategy, run) in ORACLE_STRATEGIES {
                if let Some(candidate) = run(&input) {
                    debug!(file = filename, strategy = strategy.as_str(), "extraction strategy matched");
                    return self.finalize(candidate, *strategy, &input, filename);
                }
            }
        }

        if let Some(candidate) = substitution::substitution(&input) {
            debug!(file = filename, strategy = "substitution", "extraction strategy matched");
            return self.finalize(candidate, ExtractionStrategy::Substitution, &input, filename);
        }

        Extraction::unchanged(original_content, Vec::new(), ExtractionStrategy::NoOp)
    }

    fn finalize(
        &self,
        candidate: Candidate,
        strategy: ExtractionStrategy,
        input: &StrategyInput,
        filename: &str,
    ) -> Extraction {
        let Some(fixed) = candidate.fixed_content else {
            return Extraction::unchanged(input.original, candidate.issues, strategy);
        };

        let verdict = if strategy.is_oracle_sourced() {
            self.gate
                .check_oracle_candidate(&fixed, input.original, input.language, &candidate.changes)
        } else {
            self.gate
                .check_substitution(&fixed, input.original, &candidate.changes)
        };

        match verdict {
            Ok(()) => Extraction {
                issues: candidate.issues,
                fixed_content: fixed,
                changes: candidate.changes,
                strategy,
                accepted: true,
            },
            Err(reason) => {
                info!(file = filename, strategy = strategy.as_str(), %reason, "no change applied");
                Extraction::unchanged(input.original, candidate.issues, strategy)
            }
        }
    }
}
