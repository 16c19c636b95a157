//! Knowledge stores that back the rule context provider

use crate::models::Standard;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Passages retrieved for one query plus the citations they came from
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedContext {
    pub text: String,
    pub sources: Vec<String>,
}

impl RetrievedContext {
    /// Text with a trailing `Sources:` line, or `None` when there is no text
    pub fn render(&self) -> Option<String> {
        let text = self.text.trim();
        if text.is_empty() {
            return None;
        }
        if self.sources.is_empty() {
            Some(text.to_string())
        } else {
            Some(format!("{}\n\nSources: {}", text, self.sources.join(", ")))
        }
    }
}

/// A lookup that never fails loudly; any problem is an absent result
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn retrieve(&self, query: &str) -> Option<RetrievedContext>;
}

#[derive(Debug, Serialize)]
struct RetrieveRequest<'a> {
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    passages: Vec<Passage>,
}

#[derive(Debug, Deserialize)]
struct Passage {
    text: String,
    #[serde(default)]
    source: Option<String>,
}

/// Retrieval service reached over HTTP
///
/// POSTs `{query, max_results}` and expects `{passages: [{text, source?}]}`.
pub struct HttpKnowledgeBase {
    endpoint: String,
    http_client: reqwest::Client,
    max_results: usize,
}

impl HttpKnowledgeBase {
    pub fn new(endpoint: &str) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http_client,
            max_results: 5,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    async fn request(&self, query: &str) -> anyhow::Result<RetrieveResponse> {
        use anyhow::Context;

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&RetrieveRequest {
                query,
                max_results: self.max_results,
            })
            .send()
            .await
            .context("Failed to send request to knowledge base")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Knowledge base returned status {}", status);
        }

        response
            .json::<RetrieveResponse>()
            .await
            .context("Failed to parse knowledge base response")
    }
}

#[async_trait]
impl KnowledgeBase for HttpKnowledgeBase {
    async fn retrieve(&self, query: &str) -> Option<RetrievedContext> {
        let response = match self.request(query).await {
            Ok(response) => response,
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "knowledge lookup failed");
                return None;
            }
        };

        let texts: Vec<&str> = response
            .passages
            .iter()
            .map(|p| p.text.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if texts.is_empty() {
            debug!(endpoint = %self.endpoint, "knowledge base returned no passages");
            return None;
        }

        let mut sources: Vec<String> = Vec::new();
        for source in response.passages.iter().filter_map(|p| p.source.as_ref()) {
            if !sources.contains(source) {
                sources.push(source.clone());
            }
        }

        Some(RetrievedContext {
            text: texts.join("\n\n"),
            sources,
        })
    }
}

/// Bundled summaries of the supported compliance standards
pub struct StaticKnowledgeBase {
    standards: Vec<Standard>,
}

impl StaticKnowledgeBase {
    pub fn new() -> Self {
        Self {
            standards: Standard::all_standards(),
        }
    }

    pub fn with_standards(standards: Vec<Standard>) -> Self {
        Self { standards }
    }
}

impl Default for StaticKnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeBase for StaticKnowledgeBase {
    async fn retrieve(&self, query: &str) -> Option<RetrievedContext> {
        let lowered = query.to_lowercase();
        let relevant: Vec<&Standard> = self
            .standards
            .iter()
            .filter(|s| s.is_relevant_to(&lowered))
            .collect();
        if relevant.is_empty() {
            return None;
        }

        Some(RetrievedContext {
            text: relevant
                .iter()
                .map(|s| format!("- {}: {}", s.id, s.summary))
                .collect::<Vec<_>>()
                .join("\n"),
            sources: relevant.iter().map(|s| s.name.clone()).collect(),
        })
    }
}
