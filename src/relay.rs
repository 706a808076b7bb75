use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

use crate::error::{RelayError, Result};
use crate::history::ConversationLog;
use crate::inference::{self, InferenceGateway, UnloadSummary};
use crate::prompt::{PromptBuilder, TemplateStore};
use crate::types::{MessageEntry, MessageRequest, OutboundPayload, PersonaConfig};

/// Number of logged turns shown to the model unless configured otherwise.
pub const DEFAULT_CONTEXT_WINDOW: usize = 2;

/// Owns the conversation state for one process and drives the
/// message -> prompt -> backend pipeline.
///
/// Log and template locks are only held inside synchronous calls; nothing
/// is locked while a backend request is outstanding, so slow generations
/// never serialize other requests.
pub struct Relay {
    log: ConversationLog,
    templates: TemplateStore,
    gateway: Arc<dyn InferenceGateway>,
    context_window: usize,
    latest_payload: Mutex<Option<OutboundPayload>>,
}

/// Result of relaying one message.
#[derive(Debug, Clone)]
pub struct RelayReply {
    pub message_id: String,
    /// Generated text, or `Error: ...` when the backend failed.
    pub raw_text: String,
}

/// Result of replacing the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported(usize),
    /// The log was emptied and the backend asked to release its models.
    Cleared(UnloadSummary),
}

impl Relay {
    pub fn new(gateway: Arc<dyn InferenceGateway>) -> Self {
        Self {
            log: ConversationLog::new(),
            templates: TemplateStore::new(),
            gateway,
            context_window: DEFAULT_CONTEXT_WINDOW,
            latest_payload: Mutex::new(None),
        }
    }

    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context_window = window;
        self
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn gateway(&self) -> &dyn InferenceGateway {
        self.gateway.as_ref()
    }

    pub fn context_window(&self) -> usize {
        self.context_window
    }

    /// Log an inbound message and ask the recipient's model for a reply.
    ///
    /// Fails only on invalid input, before anything is logged. Backend
    /// failures come back as reply text.
    pub async fn dispatch(&self, request: MessageRequest) -> Result<RelayReply> {
        let (sender, recipient) = validate_request(&request)?;
        let (sender, recipient) = (sender.clone(), recipient.clone());

        info!(
            sender = %request.message.sender,
            recipient = %request.message.recipients,
            "processing message"
        );

        let text = request.message.text.clone();
        let edited = request.message.is_edited_reply();

        let (message_id, context) = self.log.append_with_window(request, self.context_window);
        if edited {
            info!(message_id = %message_id, "message is an edited reply, continuing conversation");
        }

        let prompt = PromptBuilder::new(&self.templates).build(
            Some(&sender),
            Some(&recipient),
            &text,
            &context,
        );

        self.record_payload(OutboundPayload {
            message_id: message_id.clone(),
            model: recipient.model.clone(),
            temperature: recipient.temperature,
            prompt: prompt.clone(),
            timestamp: chrono::Utc::now(),
        });

        let raw_text = match self
            .gateway
            .generate(&recipient.model, &prompt, recipient.temperature)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(message_id = %message_id, model = %recipient.model, "generation failed: {e}");
                format!("Error: {e}")
            }
        };

        Ok(RelayReply {
            message_id,
            raw_text,
        })
    }

    /// Snapshot of the whole log.
    pub fn history(&self) -> Vec<MessageEntry> {
        self.log.read_all()
    }

    /// Replace the log. Clearing it also unloads every running model.
    pub async fn import_history(&self, entries: Vec<MessageEntry>) -> Result<ImportOutcome> {
        let count = self.log.replace_all(entries)?;
        if count > 0 {
            return Ok(ImportOutcome::Imported(count));
        }

        info!("history cleared, unloading running models");
        let summary = inference::unload_all(self.gateway.as_ref()).await;
        Ok(ImportOutcome::Cleared(summary))
    }

    pub fn latest_payload(&self) -> Option<OutboundPayload> {
        self.latest_payload
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record_payload(&self, payload: OutboundPayload) {
        *self
            .latest_payload
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(payload);
    }
}

/// Check the request and return its sender and recipient personas.
fn validate_request(request: &MessageRequest) -> Result<(&PersonaConfig, &PersonaConfig)> {
    for (key, persona) in &request.persona_settings {
        persona
            .validate()
            .map_err(|e| RelayError::InvalidRequest(format!("persona '{key}': {e}")))?;
    }

    let sender = request
        .sender()
        .ok_or_else(|| missing_persona("sender", &request.message.sender))?;
    let recipient = request
        .recipient()
        .ok_or_else(|| missing_persona("recipient", &request.message.recipients))?;
    Ok((sender, recipient))
}

fn missing_persona(role: &str, key: &str) -> RelayError {
    RelayError::InvalidRequest(format!("{role} '{key}' has no entry in persona_settings"))
}
