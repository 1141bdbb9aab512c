use mathbuddy_core::companion::{huggingface, openai};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// The upstream text-generation service behind the companion endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    HuggingFace,
    OpenAI,
}

impl Provider {
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::HuggingFace => huggingface::DEFAULT_MODEL,
            Provider::OpenAI => openai::DEFAULT_MODEL,
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub provider: Provider,
    /// Absent keys are not an error: every generation attempt then falls back.
    pub huggingface_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
    pub time_budget: Duration,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let provider_str =
            std::env::var("INFERENCE_PROVIDER").unwrap_or_else(|_| "huggingface".to_string());
        let provider = match provider_str.trim().to_lowercase().as_str() {
            "huggingface" | "hf" => Provider::HuggingFace,
            "openai" => Provider::OpenAI,
            other => {
                return Err(ConfigError::InvalidValue(
                    "INFERENCE_PROVIDER".to_string(),
                    format!("'{}' is not one of 'huggingface', 'openai'", other),
                ));
            }
        };

        let huggingface_api_key = non_empty_var("HUGGINGFACE_API_KEY");
        let openai_api_key = non_empty_var("OPENAI_API_KEY");

        let model = non_empty_var("INFERENCE_MODEL")
            .unwrap_or_else(|| provider.default_model().to_string());
        let base_url = non_empty_var("INFERENCE_BASE_URL");

        let time_budget = match std::env::var("INFERENCE_TIMEOUT_MS") {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "INFERENCE_TIMEOUT_MS".to_string(),
                        format!("'{}' is not a positive number of milliseconds", value),
                    )
                })?,
            Err(_) => Duration::from_millis(4000),
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            provider,
            huggingface_api_key,
            openai_api_key,
            model,
            base_url,
            time_budget,
            log_level,
        })
    }

    /// The key for the selected provider, if one is configured.
    pub fn api_key(&self) -> Option<&str> {
        match self.provider {
            Provider::HuggingFace => self.huggingface_api_key.as_deref(),
            Provider::OpenAI => self.openai_api_key.as_deref(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
