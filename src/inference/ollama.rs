use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{GatewayError, InferenceGateway, ModelInfo, RunningModel};
use crate::config::InferenceConfig;

/// Talks to an Ollama server's native API (`/generate`, `/tags`, `/ps`).
pub struct OllamaGateway {
    client: Client,
    base_url: String,
    generate_timeout: Duration,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct ModelList<T> {
    #[serde(default = "Vec::new")]
    models: Vec<T>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
    size: Option<u64>,
    #[serde(default)]
    details: TagDetails,
}

#[derive(Default, Deserialize)]
struct TagDetails {
    family: Option<String>,
    quantization_level: Option<String>,
}

impl From<TagEntry> for ModelInfo {
    fn from(tag: TagEntry) -> Self {
        let mut info = ModelInfo::named(tag.name);
        if let Some(size) = tag.size {
            info.size = size.to_string();
        }
        if let Some(family) = tag.details.family {
            info.family = family;
        }
        if let Some(quantization) = tag.details.quantization_level {
            info.quantization = quantization;
        }
        info
    }
}

impl OllamaGateway {
    pub fn new(base_url: impl Into<String>, generate_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            generate_timeout,
        }
    }

    pub fn from_config(config: &InferenceConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn get_models<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<T>, GatewayError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        let response = check_status(response).await?;
        let list: ModelList<T> = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        Ok(list.models)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    warn!(status, "inference backend returned an error: {body}");
    Err(GatewayError::Status { status, body })
}

#[async_trait]
impl InferenceGateway for OllamaGateway {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, GatewayError> {
        info!(model = %model, "generating response");

        let body = serde_json::json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": temperature },
        });

        let response = self
            .client
            .post(self.url("generate"))
            .timeout(self.generate_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(model = %model, "request to inference backend failed: {e}");
                GatewayError::Unavailable(e.to_string())
            })?;

        let response = check_status(response).await?;
        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        debug!(model = %model, chars = parsed.response.len(), "response generated");
        Ok(parsed.response)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, GatewayError> {
        let tags: Vec<TagEntry> = self.get_models("tags").await?;
        Ok(tags.into_iter().map(ModelInfo::from).collect())
    }

    async fn running_models(&self) -> Result<Vec<RunningModel>, GatewayError> {
        self.get_models("ps").await
    }

    async fn unload_model(&self, model: &str) -> Result<(), GatewayError> {
        info!(model = %model, "unloading model from memory");

        let body = serde_json::json!({
            "model": model,
            "prompt": "",
            "keep_alive": 0,
        });

        let response = self
            .client
            .post(self.url("generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        check_status(response).await?;
        info!(model = %model, "model unloaded");
        Ok(())
    }
}
