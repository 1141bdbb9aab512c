//! Hugging Face Inference API generator.

use super::inference::{GenerationParams, InferenceError, TextGenerator, usable_text};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_MODEL: &str = "microsoft/DialoGPT-medium";

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    return_full_text: bool,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceReply {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
}

pub struct HuggingFaceGenerator {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    params: GenerationParams,
}

impl HuggingFaceGenerator {
    /// # Arguments
    ///
    /// * `base_url` - Inference API root; the model id is appended to it.
    /// * `model` - Model identifier (e.g. "microsoft/DialoGPT-medium").
    /// * `api_key` - Bearer token. When absent, every call fails with
    ///   [`InferenceError::MissingApiKey`].
    /// * `timeout` - Network-level timeout for the single request.
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        params: GenerationParams,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            endpoint: format!("{}/{}", base_url.trim_end_matches('/'), model),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            params,
        }
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let api_key = self.api_key.as_ref().ok_or(InferenceError::MissingApiKey)?;

        let request = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                max_new_tokens: self.params.max_new_tokens,
                temperature: self.params.temperature,
                top_p: self.params.top_p,
                return_full_text: false,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "Received inference response");
        let text = parse_generated_text(&body)?;
        // Some models echo the prompt even with return_full_text=false.
        usable_text(text.strip_prefix(prompt).unwrap_or(&text))
    }
}

/// Extracts `generated_text` from either `[{..}]` or `{..}`.
fn parse_generated_text(body: &str) -> Result<String, InferenceError> {
    let reply: InferenceReply =
        serde_json::from_str(body).map_err(|e| InferenceError::Malformed(e.to_string()))?;
    let text = match reply {
        InferenceReply::Batch(items) => items
            .into_iter()
            .next()
            .and_then(|item| item.generated_text),
        InferenceReply::Single(item) => item.generated_text,
    };
    text.ok_or_else(|| InferenceError::Malformed("missing generated_text".to_string()))
}
