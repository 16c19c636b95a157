//! Request and response envelopes for the hosted model runtime
//!
//! Two wire shapes are supported:
//! - Messages: `{anthropic_version, max_tokens, temperature, top_p, messages}` returning
//!   `{content: [{text}]}`
//! - Input text: `{inputText, textGenerationConfig}` returning `{results: [{outputText}]}`

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Sampling parameters shared by both envelopes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvocationParams {
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
}

impl Default for InvocationParams {
    fn default() -> Self {
        Self {
            max_tokens: 3000,
            temperature: 0.1,
            top_p: 0.9,
        }
    }
}

/// Wire protocol, chosen once per client from the model id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    Messages,
    InputText,
}

impl ModelFamily {
    pub fn from_model_id(model_id: &str) -> Self {
        if model_id.to_lowercase().contains("anthropic") {
            ModelFamily::Messages
        } else {
            ModelFamily::InputText
        }
    }

    /// Serialize the request body for `prompt`
    pub fn build_body(&self, prompt: &str, params: InvocationParams) -> Result<String> {
        let body = match self {
            ModelFamily::Messages => serde_json::to_string(&MessagesRequest {
                anthropic_version: ANTHROPIC_VERSION,
                max_tokens: params.max_tokens,
                temperature: params.temperature,
                top_p: params.top_p,
                messages: vec![Message {
                    role: "user",
                    content: prompt,
                }],
            }),
            ModelFamily::InputText => serde_json::to_string(&InputTextRequest {
                input_text: prompt,
                text_generation_config: TextGenerationConfig {
                    max_token_count: params.max_tokens,
                    temperature: params.temperature,
                    top_p: params.top_p,
                },
            }),
        };
        body.context("Failed to serialize model request")
    }

    /// Pull the generated text out of a response body
    ///
    /// # Errors
    /// Returns error if the body is not the expected envelope or carries no text
    pub fn parse_output(&self, body: &str) -> Result<String> {
        match self {
            ModelFamily::Messages => {
                let response: MessagesResponse =
                    serde_json::from_str(body).context("Failed to parse messages response")?;
                response
                    .content
                    .into_iter()
                    .find_map(|block| block.text)
                    .ok_or_else(|| anyhow!("Messages response carried no text block"))
            }
            ModelFamily::InputText => {
                let response: InputTextResponse =
                    serde_json::from_str(body).context("Failed to parse input-text response")?;
                response
                    .results
                    .into_iter()
                    .next()
                    .map(|r| r.output_text)
                    .ok_or_else(|| anyhow!("Input-text response carried no results"))
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    anthropic_version: &'a str,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InputTextRequest<'a> {
    input_text: &'a str,
    text_generation_config: TextGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextGenerationConfig {
    max_token_count: u32,
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Deserialize)]
struct InputTextResponse {
    #[serde(default)]
    results: Vec<InputTextResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputTextResult {
    output_text: String,
}
