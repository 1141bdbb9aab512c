//! Study Buddy Companion
//!
//! Produces a short spoken message for the learner. The pipeline asks a
//! remote text generator first and falls back to a canned message on any
//! failure, so callers always get something to say.
//!
//! - `prompt`: prompt templates per message type.
//! - `inference`: the `TextGenerator` seam and its error type.
//! - `huggingface` / `openai`: the two upstream generator implementations.
//! - `fallback`: canned messages.
//! - `pipeline`: prompt → generator → fallback.
//! - `widget`: the on-screen companion that fetches and speaks a message.

pub mod fallback;
pub mod huggingface;
pub mod inference;
pub mod openai;
pub mod pipeline;
pub mod prompt;
pub mod widget;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use fallback::FallbackMessageBank;
pub use huggingface::HuggingFaceGenerator;
pub use inference::{GenerationParams, InferenceError, TextGenerator};
pub use openai::ChatCompletionGenerator;
pub use pipeline::CompanionPipeline;
pub use prompt::PromptBuilder;
pub use widget::{CompanionWidget, DEFAULT_TIME_BUDGET, WidgetPhase};

pub const DEFAULT_SUBJECT_NAME: &str = "Student";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Encouragement,
    Correction,
    Celebration,
    Focus,
}

impl MessageType {
    /// Parses a wire label. Anything unrecognized is treated as
    /// encouragement.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "correction" => MessageType::Correction,
            "celebration" => MessageType::Celebration,
            "focus" => MessageType::Focus,
            _ => MessageType::Encouragement,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Encouragement => "encouragement",
            MessageType::Correction => "correction",
            MessageType::Celebration => "celebration",
            MessageType::Focus => "focus",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionRequest {
    pub subject_name: String,
    pub situational_context: String,
    pub message_type: MessageType,
}

impl CompanionRequest {
    pub fn new(
        subject_name: impl Into<String>,
        situational_context: impl Into<String>,
        message_type: MessageType,
    ) -> Self {
        Self {
            subject_name: subject_name.into(),
            situational_context: situational_context.into(),
            message_type,
        }
    }
}

impl Default for CompanionRequest {
    fn default() -> Self {
        Self::new(DEFAULT_SUBJECT_NAME, "", MessageType::Encouragement)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionResponse {
    /// Never empty.
    pub message: String,
    pub used_fallback: bool,
}
