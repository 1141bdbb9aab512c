use super::MessageType;
use rand::{Rng, seq::IndexedRandom};

const NAME: &str = "{name}";

const ENCOURAGEMENT: &[&str] = &[
    "You're doing great, {name}! Keep trying!",
    "Keep going, {name}! You've got this!",
    "Great job, {name}! Keep going!",
];

const CORRECTION: &[&str] = &[
    "That's okay, {name}! Let's try again together.",
    "Good try, {name}! Let's look at it one more time.",
];

const CELEBRATION: &[&str] = &[
    "Amazing work, {name}! You did it!",
    "Hooray, {name}! You got it right!",
    "Wow, {name}! You are a math star!",
];

const FOCUS: &[&str] = &[
    "Let's focus, {name}. You can do this!",
    "Eyes on the puzzle, {name}. You can do this!",
];

/// Canned messages used whenever remote generation is unusable. The bank is
/// chosen by message type; the message within it is chosen at random.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackMessageBank;

impl FallbackMessageBank {
    pub fn templates(&self, message_type: MessageType) -> &'static [&'static str] {
        match message_type {
            MessageType::Encouragement => ENCOURAGEMENT,
            MessageType::Correction => CORRECTION,
            MessageType::Celebration => CELEBRATION,
            MessageType::Focus => FOCUS,
        }
    }

    pub fn pick<R: Rng>(
        &self,
        message_type: MessageType,
        subject_name: &str,
        rng: &mut R,
    ) -> String {
        let template = self
            .templates(message_type)
            .choose(rng)
            .copied()
            .unwrap_or(ENCOURAGEMENT[0]);
        template.replace(NAME, subject_name)
    }
}
