use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::api;
use crate::config::RelayConfig;
use crate::inference::{InferenceGateway, OllamaGateway};
use crate::relay::Relay;

pub struct AppState {
    pub relay: Relay,
    pub config: RelayConfig,
}

impl AppState {
    pub fn new(config: RelayConfig, gateway: Arc<dyn InferenceGateway>) -> Self {
        let relay = Relay::new(gateway).with_context_window(config.conversation.context_window);
        Self { relay, config }
    }
}

/// Build the HTTP router over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/message", post(api::process_message))
        .route("/history", get(api::get_history).post(api::import_history))
        .route(
            "/prompt_template",
            get(api::get_prompt_template).post(api::update_prompt_template),
        )
        .route("/models", get(api::get_models))
        .route("/running-models", get(api::get_running_models))
        .route("/unload-model/{model_name}", post(api::unload_model))
        .route("/unload-all-models", post(api::unload_all_models))
        .route("/latest-payload", get(api::latest_payload));

    Router::new()
        .route("/", get(api::root))
        .route("/health", get(health))
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the relay against an Ollama backend until the process is stopped.
pub async fn run(config: RelayConfig) -> anyhow::Result<()> {
    let gateway = Arc::new(OllamaGateway::from_config(&config.inference));
    info!(backend = %gateway.base_url(), "inference backend configured");
    serve(config, gateway).await
}

/// Serve the relay against any backend.
pub async fn serve(config: RelayConfig, gateway: Arc<dyn InferenceGateway>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.gateway.bind, config.gateway.port);
    let is_loopback = config.gateway.bind == "127.0.0.1" || config.gateway.bind == "::1";

    let state = Arc::new(AppState::new(config, gateway));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("parley relay listening on {addr}");
    if !is_loopback {
        warn!("bound to {addr}, the API has no authentication");
    }

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}
