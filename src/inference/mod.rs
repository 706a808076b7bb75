pub mod ollama;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub use ollama::OllamaGateway;

/// Failures talking to the inference backend. The display text is what a
/// caller sees in place of a generated reply.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Failed to connect to inference backend")]
    Unavailable(String),

    #[error("Failed to generate response. Status code: {status}")]
    Status { status: u16, body: String },

    #[error("Malformed backend response: {0}")]
    Malformed(String),
}

/// The only seam between the relay and a model backend.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Generate a completion for `prompt` with the given model.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, GatewayError>;

    /// Models installed on the backend.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, GatewayError>;

    /// Models currently loaded into memory.
    async fn running_models(&self) -> Result<Vec<RunningModel>, GatewayError>;

    /// Evict a model from memory.
    async fn unload_model(&self, model: &str) -> Result<(), GatewayError>;
}

/// An installed model. Attributes the backend did not report are `"unknown"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default = "unknown")]
    pub size: String,
    #[serde(default = "unknown")]
    pub quantization: String,
    #[serde(default = "unknown")]
    pub family: String,
}

impl ModelInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: unknown(),
            quantization: unknown(),
            family: unknown(),
        }
    }
}

fn unknown() -> String {
    "unknown".into()
}

/// A model loaded in backend memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningModel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_vram: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

impl RunningModel {
    /// Identifier to pass to [`InferenceGateway::unload_model`].
    pub fn unload_key(&self) -> Option<&str> {
        [self.model.as_str(), self.name.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
    }
}

/// Outcome of unloading every running model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnloadSummary {
    pub unloaded: usize,
    pub failed: usize,
}

/// Unload every model the backend reports as running. Failing to list the
/// running models counts as nothing to unload.
pub async fn unload_all(gateway: &dyn InferenceGateway) -> UnloadSummary {
    let running = match gateway.running_models().await {
        Ok(models) => models,
        Err(e) => {
            warn!("failed to list running models: {e}");
            return UnloadSummary::default();
        }
    };

    let mut summary = UnloadSummary::default();
    for model in &running {
        let Some(key) = model.unload_key() else {
            continue;
        };
        match gateway.unload_model(key).await {
            Ok(()) => summary.unloaded += 1,
            Err(e) => {
                warn!(model = %key, "failed to unload model: {e}");
                summary.failed += 1;
            }
        }
    }
    summary
}
