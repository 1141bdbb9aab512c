//! Speech Output
//!
//! The process owns one speech device. `SpeechDevice::speak` revokes whatever
//! was speaking before, hands the utterance to the engine and, while the
//! engine reports speech, drives a mouth open/closed signal every 200 ms.
//! Every session tears its animation timer down on its own when it ends,
//! errors, is stopped or is dropped.

pub mod animation;
pub mod session;

use tokio::sync::mpsc::UnboundedSender;

pub use animation::{MOUTH_PERIOD, MouthAnimation};
pub use session::{SpeechDevice, SpeechHandle, SpeechStatus};

/// Voice parameters passed to the engine with every utterance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSettings {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            rate: 0.9,
            pitch: 1.1,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: VoiceSettings,
}

/// Lifecycle events reported by the engine for one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Started,
    Ended,
    Error(String),
}

/// A text-to-speech backend.
///
/// `speak` must return immediately; the engine reports progress later by
/// sending events on `events`. `cancel` stops whatever the engine is saying.
pub trait SpeechEngine: Send + Sync {
    fn speak(&self, utterance: Utterance, events: UnboundedSender<SpeechEvent>);
    fn cancel(&self);
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Records utterances and lets a test play the engine's events.
    #[derive(Default)]
    pub struct ScriptedEngine {
        pub spoken: Mutex<Vec<Utterance>>,
        pub cancels: Mutex<usize>,
        senders: Mutex<Vec<UnboundedSender<SpeechEvent>>>,
        pub auto_start: bool,
    }

    impl ScriptedEngine {
        pub fn auto_starting() -> Self {
            Self {
                auto_start: true,
                ..Self::default()
            }
        }

        /// Sends `event` for the most recent utterance.
        pub fn emit(&self, event: SpeechEvent) {
            if let Some(sender) = self.senders.lock().unwrap().last() {
                let _ = sender.send(event);
            }
        }

        pub fn cancel_count(&self) -> usize {
            *self.cancels.lock().unwrap()
        }

        pub fn spoken_texts(&self) -> Vec<String> {
            self.spoken.lock().unwrap().iter().map(|u| u.text.clone()).collect()
        }
    }

    impl SpeechEngine for ScriptedEngine {
        fn speak(&self, utterance: Utterance, events: UnboundedSender<SpeechEvent>) {
            if self.auto_start {
                let _ = events.send(SpeechEvent::Started);
            }
            self.spoken.lock().unwrap().push(utterance);
            self.senders.lock().unwrap().push(events);
        }

        fn cancel(&self) {
            *self.cancels.lock().unwrap() += 1;
        }
    }
}
