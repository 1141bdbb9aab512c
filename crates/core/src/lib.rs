pub mod activity;
pub mod companion;
pub mod speech;

pub use companion::{CompanionRequest, CompanionResponse, MessageType};
