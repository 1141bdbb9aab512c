use super::inference::{GenerationParams, InferenceError, TextGenerator, usable_text};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
};
use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// A `TextGenerator` for any OpenAI-compatible chat completion API. The
/// prompt is sent as a single user message.
pub struct ChatCompletionGenerator {
    client: Option<Client<OpenAIConfig>>,
    model: String,
    params: GenerationParams,
}

impl ChatCompletionGenerator {
    /// Creates a generator for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `api_key` - When absent or blank, every call fails with
    ///   [`InferenceError::MissingApiKey`].
    /// * `base_url` - Overrides the default OpenAI endpoint.
    /// * `model` - The chat model identifier (e.g., "gpt-4o-mini").
    pub fn new(
        api_key: Option<String>,
        base_url: Option<&str>,
        model: String,
        params: GenerationParams,
        timeout: Duration,
    ) -> Self {
        let client = api_key.filter(|key| !key.trim().is_empty()).map(|key| {
            let mut config = OpenAIConfig::new().with_api_key(key);
            if let Some(base_url) = base_url {
                config = config.with_api_base(base_url);
            }
            let http = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default();
            Client::with_config(config).with_http_client(http)
        });

        Self {
            client,
            model,
            params,
        }
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let client = self.client.as_ref().ok_or(InferenceError::MissingApiKey)?;

        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?;
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message.into()])
            .max_completion_tokens(self.params.max_new_tokens)
            .temperature(self.params.temperature)
            .top_p(self.params.top_p)
            .build()?;

        let response = client.chat().create(request).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                InferenceError::Malformed("no message content in first choice".to_string())
            })?;

        usable_text(&content)
    }
}
