//! HTTP client for the hosted model runtime
//!
//! Endpoint: POST `{endpoint}/model/{model_id}/invoke` with a bearer key.
//! Every call is recorded in the cost ledger, including failed ones.

use super::envelope::{InvocationParams, ModelFamily};
use super::Oracle;
use crate::config::{validate_api_key, ConfigError, ScannerConfig};
use crate::models::{CostLedger, ModelPricing};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT_SECS: u64 = 120;

pub struct OracleClient {
    api_key: String,
    http_client: Client,
    endpoint: String,
    model_id: String,
    family: ModelFamily,
    params: InvocationParams,
    pricing: ModelPricing,
    ledger: Mutex<CostLedger>,
}

impl OracleClient {
    /// Create a client from the scanner configuration
    ///
    /// # Errors
    /// Returns error if the API key is missing or malformed
    pub fn from_config(config: &ScannerConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?.to_string();
        let params = InvocationParams {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        };
        Self::with_url(api_key, config.oracle_endpoint.clone(), &config.model_id, params)
    }

    /// Create client with a custom endpoint (for testing/staging)
    pub fn with_url(
        api_key: String,
        endpoint: String,
        model_id: &str,
        params: InvocationParams,
    ) -> Result<Self, ConfigError> {
        validate_api_key(&api_key)?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Ok(Self {
            api_key,
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model_id: model_id.to_string(),
            family: ModelFamily::from_model_id(model_id),
            params,
            pricing: ModelPricing::for_model(model_id),
            ledger: Mutex::new(CostLedger::default()),
        })
    }

    pub fn family(&self) -> ModelFamily {
        self.family
    }

    fn invoke_url(&self) -> String {
        format!("{}/model/{}/invoke", self.endpoint, self.model_id)
    }

    fn record_call(&self, input_chars: usize, output_chars: usize) {
        let cost = self.pricing.estimate(input_chars, output_chars);
        let mut ledger = self.ledger.lock().unwrap_or_else(|e| e.into_inner());
        ledger.record(cost);
    }

    /// Send one request and return the generated text
    async fn call_api(&self, prompt: &str) -> Result<String> {
        let body = self.family.build_body(prompt, self.params)?;

        let response = self
            .http_client
            .post(self.invoke_url())
            .header("Authorization", format!("Bearer {}", &self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await
            .context("Failed to send request to model runtime")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            return Err(anyhow!("Model runtime error ({}): {}", status, response_text));
        }

        self.family.parse_output(&response_text)
    }
}

#[async_trait]
impl Oracle for OracleClient {
    async fn invoke(&self, prompt: &str) -> Option<String> {
        let input_chars = prompt.chars().count();

        match self.call_api(prompt).await {
            Ok(text) => {
                let output_chars = text.chars().count();
                self.record_call(input_chars, output_chars);
                debug!(model = %self.model_id, input_chars, output_chars, "oracle call complete");
                Some(text)
            }
            Err(e) => {
                self.record_call(input_chars, 0);
                warn!(model = %self.model_id, error = %e, "oracle call failed");
                None
            }
        }
    }

    fn ledger(&self) -> CostLedger {
        *self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
