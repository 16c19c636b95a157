//! Published-advisory lookups for pinned dependencies

pub mod manifest;

pub use manifest::{parse_manifest, Dependency};

use crate::models::{Severity, VulnerabilityFinding};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_OSV_ENDPOINT: &str = "https://api.osv.dev";

#[async_trait]
pub trait AdvisoryFeed: Send + Sync {
    /// Advisories affecting `dependency`; lookup failures yield an empty list
    async fn lookup(&self, dependency: &Dependency) -> Vec<VulnerabilityFinding>;
}

/// OSV query API client
pub struct OsvFeed {
    endpoint: String,
    http_client: reqwest::Client,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    package: QueryPackage<'a>,
    version: &'a str,
}

#[derive(Serialize)]
struct QueryPackage<'a> {
    name: &'a str,
    ecosystem: &'a str,
}

#[derive(Deserialize, Default)]
struct QueryResponse {
    #[serde(default)]
    vulns: Vec<OsvVuln>,
}

#[derive(Deserialize)]
struct OsvVuln {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    database_specific: Option<DatabaseSpecific>,
}

#[derive(Deserialize)]
struct DatabaseSpecific {
    #[serde(default)]
    severity: Option<String>,
}

impl OsvFeed {
    pub fn new(endpoint: &str) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    async fn query(&self, dependency: &Dependency) -> anyhow::Result<QueryResponse> {
        use anyhow::Context;

        let response = self
            .http_client
            .post(format!("{}/v1/query", self.endpoint))
            .json(&QueryRequest {
                package: QueryPackage {
                    name: &dependency.name,
                    ecosystem: dependency.ecosystem,
                },
                version: &dependency.version,
            })
            .send()
            .await
            .context("Failed to send advisory query")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Advisory feed returned status {}", status);
        }

        response
            .json::<QueryResponse>()
            .await
            .context("Failed to parse advisory response")
    }
}

#[async_trait]
impl AdvisoryFeed for OsvFeed {
    async fn lookup(&self, dependency: &Dependency) -> Vec<VulnerabilityFinding> {
        let response = match self.query(dependency).await {
            Ok(response) => response,
            Err(e) => {
                warn!(package = %dependency.name, version = %dependency.version, error = %e, "advisory lookup failed");
                return Vec::new();
            }
        };

        debug!(package = %dependency.name, advisories = response.vulns.len(), "advisory lookup complete");
        response
            .vulns
            .into_iter()
            .map(|vuln| to_finding(vuln, dependency))
            .collect()
    }
}

fn to_finding(vuln: OsvVuln, dependency: &Dependency) -> VulnerabilityFinding {
    let severity = vuln
        .database_specific
        .and_then(|d| d.severity)
        .and_then(|s| Severity::from_str(&s))
        .unwrap_or(Severity::Medium);

    VulnerabilityFinding {
        id: vuln.id,
        package: dependency.name.clone(),
        version: dependency.version.clone(),
        ecosystem: dependency.ecosystem.to_string(),
        summary: vuln.summary.unwrap_or_default(),
        severity,
        manifest: dependency.manifest.clone(),
    }
}
