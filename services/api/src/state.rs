//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the companion
//! pipeline and the loaded configuration.

use crate::config::{Config, Provider};
use mathbuddy_core::companion::{
    ChatCompletionGenerator, CompanionPipeline, GenerationParams, HuggingFaceGenerator,
    TextGenerator, huggingface,
};
use std::sync::Arc;
use tracing::{info, warn};

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<CompanionPipeline>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(generator: Arc<dyn TextGenerator>, config: Config) -> Self {
        Self {
            pipeline: Arc::new(CompanionPipeline::new(generator)),
            config: Arc::new(config),
        }
    }

    /// Builds the generator for the configured provider. A missing API key
    /// still yields a working state; every request then gets a fallback.
    pub fn from_config(config: Config) -> Self {
        let api_key = config.api_key().map(str::to_string);
        if api_key.is_none() {
            warn!(
                provider = ?config.provider,
                "No API key configured; all companion messages will use fallbacks"
            );
        }

        let generator: Arc<dyn TextGenerator> = match &config.provider {
            Provider::HuggingFace => {
                info!("Using Hugging Face provider.");
                Arc::new(HuggingFaceGenerator::new(
                    config
                        .base_url
                        .as_deref()
                        .unwrap_or(huggingface::DEFAULT_BASE_URL),
                    &config.model,
                    api_key,
                    GenerationParams::default(),
                    config.time_budget,
                ))
            }
            Provider::OpenAI => {
                info!("Using OpenAI provider.");
                Arc::new(ChatCompletionGenerator::new(
                    api_key,
                    config.base_url.as_deref(),
                    config.model.clone(),
                    GenerationParams::default(),
                    config.time_budget,
                ))
            }
        };

        Self::new(generator, config)
    }
}
