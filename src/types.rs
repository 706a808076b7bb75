use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A persona as supplied by the client on every request.
///
/// Personas are never stored on their own; a snapshot of the map travels
/// with each logged message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.7
}

impl PersonaConfig {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: None,
            model: model.into(),
            temperature: default_temperature(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Check the constraints a persona must satisfy before it is used.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("persona name cannot be empty".into());
        }
        if !self.temperature.is_finite() || !(0.0..=1.0).contains(&self.temperature) {
            return Err(format!(
                "temperature {} for persona '{}' must be within [0.0, 1.0]",
                self.temperature, self.name
            ));
        }
        Ok(())
    }
}

/// Persona key to persona configuration. Ordered so logged snapshots
/// serialize deterministically.
pub type PersonaSettings = BTreeMap<String, PersonaConfig>;

/// A single message from one persona to another.
///
/// `recipients` names exactly one persona key; messaging is one-to-one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub recipients: String,
    pub text: String,
    /// Present when `text` is a human edit of a previously generated reply.
    #[serde(default)]
    pub raw_text: Option<String>,
}

impl Message {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipients: recipient.into(),
            text: text.into(),
            raw_text: None,
        }
    }

    pub fn is_edited_reply(&self) -> bool {
        self.raw_text.is_some()
    }
}

/// Inbound message payload, before an id has been assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    pub timestamp: String,
    pub persona_settings: PersonaSettings,
    pub message: Message,
}

impl MessageRequest {
    pub fn sender(&self) -> Option<&PersonaConfig> {
        self.persona_settings.get(&self.message.sender)
    }

    pub fn recipient(&self) -> Option<&PersonaConfig> {
        self.persona_settings.get(&self.message.recipients)
    }
}

/// A logged message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub message_id: String,
    /// Caller-supplied; not checked for monotonicity.
    pub timestamp: String,
    pub persona_settings: PersonaSettings,
    pub message: Message,
}

impl MessageEntry {
    pub fn sender(&self) -> &str {
        &self.message.sender
    }

    pub fn text(&self) -> &str {
        &self.message.text
    }
}

/// One prior turn as exposed to the prompt builder: speaker and text only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextTurn {
    pub sender: String,
    pub text: String,
}

impl ContextTurn {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
        }
    }
}

impl From<&MessageEntry> for ContextTurn {
    fn from(entry: &MessageEntry) -> Self {
        Self {
            sender: entry.message.sender.clone(),
            text: entry.message.text.clone(),
        }
    }
}

/// The most recent prompt handed to the inference backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundPayload {
    pub message_id: String,
    pub model: String,
    pub temperature: f32,
    pub prompt: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
