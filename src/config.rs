use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

/// Top-level configuration loaded from TOML.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub gateway: GatewayConfig,
    pub inference: InferenceConfig,
    pub conversation: ConversationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

fn default_port() -> u16 {
    8000
}
fn default_bind() -> String {
    "127.0.0.1".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Upper bound on a single generate call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Reported by the models endpoint when the backend lists nothing.
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            fallback_model: default_fallback_model(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434/api".into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_fallback_model() -> String {
    "dolphin-phi".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Number of logged turns shown to the model as prior conversation.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
        }
    }
}

fn default_context_window() -> usize {
    2
}

/// Load configuration from file or use defaults.
///
/// Search order:
/// 1. `PARLEY_CONFIG` env var
/// 2. `~/.parley/config.toml`
/// 3. Zero-config defaults (no file needed)
///
/// `OLLAMA_API_URL` overrides `inference.base_url` either way.
pub fn load() -> anyhow::Result<RelayConfig> {
    let path = config_path();

    let mut config = if path.exists() {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        let config: RelayConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("invalid config at {}: {e}", path.display()))?;
        info!("loaded config from {}", path.display());
        config
    } else {
        info!("no config file found, using zero-config defaults");
        RelayConfig::default()
    };

    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("PARLEY_CONFIG") {
        return PathBuf::from(path);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    PathBuf::from(home).join(".parley").join("config.toml")
}

fn apply_env_overrides(config: &mut RelayConfig) {
    if let Ok(url) = std::env::var("OLLAMA_API_URL") {
        if !url.trim().is_empty() {
            config.inference.base_url = url;
        }
    }
}

/// Validate the config and return clear error messages.
pub fn validate(config: &RelayConfig) -> anyhow::Result<()> {
    let url = reqwest::Url::parse(&config.inference.base_url).map_err(|e| {
        anyhow::anyhow!(
            "invalid inference.base_url '{}': {e}",
            config.inference.base_url
        )
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!(
            "inference.base_url must use http or https, got '{}'",
            url.scheme()
        );
    }

    if config.inference.timeout_secs == 0 {
        anyhow::bail!("inference.timeout_secs must be > 0");
    }

    if config.inference.fallback_model.trim().is_empty() {
        anyhow::bail!("inference.fallback_model cannot be empty");
    }

    if config.gateway.bind.trim().is_empty() {
        anyhow::bail!("gateway.bind cannot be empty");
    }

    Ok(())
}
