use super::{
    CompanionRequest, CompanionResponse, FallbackMessageBank, InferenceError, PromptBuilder,
    TextGenerator,
};
use rand::{SeedableRng, rngs::StdRng};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Prompt → remote generator → fallback. `get_message` never fails and never
/// returns an empty message.
pub struct CompanionPipeline {
    generator: Arc<dyn TextGenerator>,
    prompts: PromptBuilder,
    fallbacks: FallbackMessageBank,
    rng: Mutex<StdRng>,
}

impl CompanionPipeline {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self::with_rng(generator, StdRng::from_os_rng())
    }

    /// Same as `new`, but fallback selection is reproducible.
    pub fn with_seed(generator: Arc<dyn TextGenerator>, seed: u64) -> Self {
        Self::with_rng(generator, StdRng::seed_from_u64(seed))
    }

    fn with_rng(generator: Arc<dyn TextGenerator>, rng: StdRng) -> Self {
        Self {
            generator,
            prompts: PromptBuilder::default(),
            fallbacks: FallbackMessageBank,
            rng: Mutex::new(rng),
        }
    }

    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub async fn get_message(
        &self,
        request: &CompanionRequest,
        time_budget: Duration,
    ) -> CompanionResponse {
        let prompt = self.prompts.build(request);
        debug!(message_type = %request.message_type, "Requesting companion message");

        let attempt = tokio::time::timeout(time_budget, self.generator.generate(&prompt));
        let outcome = match attempt.await {
            Ok(result) => result,
            Err(_) => Err(InferenceError::Timeout(time_budget.as_millis())),
        };

        match outcome {
            Ok(message) if !message.trim().is_empty() => CompanionResponse {
                message: message.trim().to_string(),
                used_fallback: false,
            },
            Ok(_) => self.fallback(request, InferenceError::EmptyText),
            Err(e) => self.fallback(request, e),
        }
    }

    fn fallback(&self, request: &CompanionRequest, cause: InferenceError) -> CompanionResponse {
        warn!(
            message_type = %request.message_type,
            error = %cause,
            "Remote generation unusable, using fallback message"
        );
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        CompanionResponse {
            message: self
                .fallbacks
                .pick(request.message_type, request.subject_name.trim(), &mut *rng),
            used_fallback: true,
        }
    }
}
