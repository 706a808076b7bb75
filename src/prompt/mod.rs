pub mod builder;
pub mod render;

use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

use crate::error::{RelayError, Result};
pub use builder::PromptBuilder;
pub use render::{PromptFields, RenderError};

/// Template used until a client replaces it.
pub const DEFAULT_TEMPLATE: &str = "System: {recipient_system_prompt}

You are {recipient_name} having a conversation with {sender_name}.

Previous conversation:
{conversation_history}

{sender_name}: {message_text}

{recipient_name}:";

/// Holds the process-wide prompt template.
///
/// Last write wins. A render takes a snapshot of the template when it
/// starts, so a concurrent update is seen either entirely or not at all.
pub struct TemplateStore {
    current: RwLock<Arc<str>>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::from(DEFAULT_TEMPLATE)),
        }
    }

    /// Replace the template. Empty or whitespace-only text is rejected and
    /// leaves the current template in place.
    pub fn set_template(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(RelayError::InvalidTemplate(
                "template cannot be empty".into(),
            ));
        }

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::from(text);
        info!(len = text.len(), "prompt template updated");
        Ok(())
    }

    /// The current template, verbatim.
    pub fn get_template(&self) -> String {
        self.snapshot().to_string()
    }

    /// Render the current template, falling back to the minimal prompt on
    /// any render failure.
    pub fn render(&self, fields: &PromptFields) -> String {
        let template = self.snapshot();
        match render::render(&template, fields) {
            Ok(prompt) if !prompt.is_empty() => prompt,
            Ok(_) => {
                warn!("prompt template rendered to empty text, using fallback prompt");
                render::render_fallback(fields)
            }
            Err(e) => {
                warn!("error formatting prompt template: {e}, using fallback prompt");
                render::render_fallback(fields)
            }
        }
    }

    fn snapshot(&self) -> Arc<str> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        current.clone()
    }
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::new()
    }
}
