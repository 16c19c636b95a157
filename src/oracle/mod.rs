//! The oracle: a hosted language model asked to find and fix issues
//!
//! Output is untrusted free text; structure is recovered by the extractor.

pub mod client;
pub mod envelope;
pub mod prompt;

pub use client::OracleClient;
pub use envelope::{InvocationParams, ModelFamily};
pub use prompt::{build_scan_prompt, PromptRequest};

use crate::models::CostLedger;
use async_trait::async_trait;

#[async_trait]
pub trait Oracle: Send + Sync {
    /// Generated text for `prompt`, or `None` on any transport, status or parse failure
    async fn invoke(&self, prompt: &str) -> Option<String>;

    /// Snapshot of calls made and cost accumulated so far
    fn ledger(&self) -> CostLedger;

    fn model_id(&self) -> &str;
}
