use super::{PromptFields, TemplateStore};
use crate::types::{ContextTurn, PersonaConfig};

/// History text used when there are no prior turns.
pub const EMPTY_HISTORY: &str = "No previous conversation.";

const UNKNOWN_NAME: &str = "Unknown";
const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant.";

/// Assembles the outbound prompt from personas, message and context.
pub struct PromptBuilder<'a> {
    templates: &'a TemplateStore,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(templates: &'a TemplateStore) -> Self {
        Self { templates }
    }

    pub fn build(
        &self,
        sender: Option<&PersonaConfig>,
        recipient: Option<&PersonaConfig>,
        message_text: &str,
        context: &[ContextTurn],
    ) -> String {
        let fields = prompt_fields(sender, recipient, message_text, context);
        self.templates.render(&fields)
    }
}

/// Resolve the template fields, applying the defaults for missing personas
/// or system prompts.
pub fn prompt_fields(
    sender: Option<&PersonaConfig>,
    recipient: Option<&PersonaConfig>,
    message_text: &str,
    context: &[ContextTurn],
) -> PromptFields {
    PromptFields {
        sender_name: sender
            .map(|p| p.name.clone())
            .unwrap_or_else(|| UNKNOWN_NAME.into()),
        recipient_name: recipient
            .map(|p| p.name.clone())
            .unwrap_or_else(|| UNKNOWN_NAME.into()),
        recipient_system_prompt: recipient
            .and_then(|p| p.system_prompt.clone())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.into()),
        message_text: message_text.to_string(),
        conversation_history: format_history(context),
    }
}

/// `sender: text` blocks separated by a blank line.
pub fn format_history(context: &[ContextTurn]) -> String {
    if context.is_empty() {
        return EMPTY_HISTORY.to_string();
    }

    context
        .iter()
        .map(|turn| format!("{}: {}", turn.sender, turn.text))
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim_end()
        .to_string()
}
