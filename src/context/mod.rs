//! Rule context retrieval
//!
//! Fetches compliance guidance for a query from a knowledge store. Queries over
//! the input ceiling are split into line-aligned chunks; at most `max_chunks` of
//! them are sent and the answers are joined in order.

pub mod knowledge;

pub use knowledge::{HttpKnowledgeBase, KnowledgeBase, RetrievedContext, StaticKnowledgeBase};

use tracing::debug;

pub const DEFAULT_CONTEXT_CEILING: usize = 18_000;
pub const DEFAULT_MAX_CHUNKS: usize = 3;

pub struct RuleContextProvider {
    knowledge: Box<dyn KnowledgeBase>,
    ceiling: usize,
    max_chunks: usize,
}

impl RuleContextProvider {
    pub fn new(knowledge: Box<dyn KnowledgeBase>) -> Self {
        Self {
            knowledge,
            ceiling: DEFAULT_CONTEXT_CEILING,
            max_chunks: DEFAULT_MAX_CHUNKS,
        }
    }

    pub fn with_limits(mut self, ceiling: usize, max_chunks: usize) -> Self {
        self.ceiling = ceiling.max(1);
        self.max_chunks = max_chunks.max(1);
        self
    }

    /// Context text for `query`, or `None` when nothing useful came back
    pub async fn fetch(&self, query: &str) -> Option<String> {
        if query.trim().is_empty() {
            return None;
        }

        let chunks = chunk_query(query, self.ceiling, self.max_chunks);
        if chunks.len() == 1 {
            return self.knowledge.retrieve(&chunks[0]).await?.render();
        }

        debug!(chunks = chunks.len(), ceiling = self.ceiling, "splitting context query");
        let total = chunks.len();
        let mut parts = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            if let Some(text) = self.knowledge.retrieve(chunk).await.and_then(|c| c.render()) {
                parts.push(format!("--- context chunk {}/{} ---\n{}", idx + 1, total, text));
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }
}

/// Split `query` into line-aligned chunks of at most `ceiling` characters
///
/// A single line longer than the ceiling is hard-split on character
/// boundaries. Only the first `max_chunks` chunks are returned.
pub fn chunk_query(query: &str, ceiling: usize, max_chunks: usize) -> Vec<String> {
    let ceiling = ceiling.max(1);
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in query.split_inclusive('\n') {
        if chunks.len() >= max_chunks {
            break;
        }

        let line_len = line.chars().count();
        if line_len > ceiling {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(ceiling) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        if current_len + line_len > ceiling {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks.truncate(max_chunks);
    chunks
}
