//! API Models
//!
//! Wire types for the companion endpoint, shared with the OpenAPI document
//! generated by `utoipa`.

use mathbuddy_core::companion::{CompanionRequest, CompanionResponse, DEFAULT_SUBJECT_NAME};
use mathbuddy_core::MessageType;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body of `POST /api/companion`. Every field is optional.
#[derive(Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanionPayload {
    #[schema(example = "Amara")]
    pub student_name: String,
    #[schema(example = "found the match")]
    pub context: String,
    /// One of `encouragement`, `correction`, `celebration`, `focus`.
    /// Anything else is treated as `encouragement`.
    #[serde(rename = "type")]
    #[schema(example = "celebration")]
    pub message_type: String,
}

impl Default for CompanionPayload {
    fn default() -> Self {
        Self {
            student_name: DEFAULT_SUBJECT_NAME.to_string(),
            context: String::new(),
            message_type: MessageType::Encouragement.as_str().to_string(),
        }
    }
}

impl CompanionPayload {
    /// Lenient parse: an unreadable body is treated as an empty one.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    pub fn into_request(self) -> CompanionRequest {
        let subject_name = match self.student_name.trim() {
            "" => DEFAULT_SUBJECT_NAME.to_string(),
            name => name.to_string(),
        };
        CompanionRequest::new(
            subject_name,
            self.context,
            MessageType::from_label(&self.message_type),
        )
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompanionReply {
    pub message: String,
    pub student_name: String,
    /// Present, and `true`, only when the message is a canned fallback.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub using_fallback: bool,
}

impl CompanionReply {
    pub fn new(student_name: String, response: CompanionResponse) -> Self {
        Self {
            message: response.message,
            student_name,
            using_fallback: response.used_fallback,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
