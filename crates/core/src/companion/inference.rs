use async_openai::error::OpenAIError;
use async_trait::async_trait;

/// Any way a generation attempt can end up unusable. The pipeline treats
/// every variant the same: it falls back to a canned message.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("No API key configured for the text-generation service")]
    MissingApiKey,
    #[error("Request to the text-generation service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Text-generation service returned status {0}")]
    Status(u16),
    #[error("Malformed response payload: {0}")]
    Malformed(String),
    #[error("Generated text was empty")]
    EmptyText,
    #[error("Text generation exceeded its {0} ms budget")]
    Timeout(u128),
    #[error("Chat completion failed: {0}")]
    OpenAI(#[from] OpenAIError),
}

/// Fixed generation settings sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 100,
            temperature: 0.8,
            top_p: 0.9,
        }
    }
}

/// A remote text-generation service. One call, one attempt: implementations
/// must not retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the generated text, already trimmed and non-empty.
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError>;
}

/// Trims generated text and rejects it when nothing is left.
pub(crate) fn usable_text(text: &str) -> Result<String, InferenceError> {
    let text = text.trim();
    if text.is_empty() {
        Err(InferenceError::EmptyText)
    } else {
        Ok(text.to_string())
    }
}
