use super::{CompanionRequest, MessageType};

/// Context longer than this is cut before it goes into a prompt.
pub const MAX_CONTEXT_CHARS: usize = 240;

/// Maps a companion request to one of four prompt templates.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_context_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            max_context_chars: MAX_CONTEXT_CHARS,
        }
    }
}

impl PromptBuilder {
    pub fn with_max_context_chars(mut self, max: usize) -> Self {
        self.max_context_chars = max;
        self
    }

    pub fn build(&self, request: &CompanionRequest) -> String {
        let name = request.subject_name.trim();
        let context = self.clip(request.situational_context.trim());

        let prompt = match request.message_type {
            MessageType::Encouragement => format!(
                "You are {name}'s friendly study buddy for early math. {context} \
                 Give them a short, warm, encouraging message in simple words (2-3 sentences max)."
            ),
            MessageType::Correction => format!(
                "You are {name}'s patient study buddy for early math. {context} \
                 Gently help them understand their mistake with a kind explanation (2-3 sentences max)."
            ),
            MessageType::Celebration => format!(
                "You are {name}'s enthusiastic study buddy for early math. {context} \
                 Celebrate their success warmly (2-3 sentences max)."
            ),
            MessageType::Focus => format!(
                "You are {name}'s supportive study buddy for early math. {context} \
                 Help them refocus with a gentle reminder about staying on task (2-3 sentences max)."
            ),
        };
        collapse_whitespace(&prompt)
    }

    fn clip<'a>(&self, context: &'a str) -> &'a str {
        match context.char_indices().nth(self.max_context_chars) {
            Some((cut, _)) => context[..cut].trim_end(),
            None => context,
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
