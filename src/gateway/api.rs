//! Request handlers for the `/api` routes.
//!
//! Handlers only translate between JSON and [`Relay`](crate::relay::Relay)
//! calls; every rule about history or prompts lives in the library.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::server::AppState;
use crate::error::RelayError;
use crate::inference::{self, ModelInfo, RunningModel};
use crate::relay::ImportOutcome;
use crate::types::{MessageEntry, MessageRequest, OutboundPayload};

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match &self {
            RelayError::InvalidTemplate(_)
            | RelayError::MalformedImport(_)
            | RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::Gateway(_) => StatusCode::BAD_GATEWAY,
        };
        warn!(%status, "request failed: {self}");
        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, RelayError>;

#[derive(Serialize)]
pub struct RootResponse {
    message: &'static str,
    version: &'static str,
    timestamp: String,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Parley relay is running",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: now(),
    })
}

#[derive(Serialize)]
pub struct MessageResponse {
    message_id: String,
    status: &'static str,
    timestamp: String,
    response: ReplyBody,
}

#[derive(Serialize)]
struct ReplyBody {
    raw_text: String,
}

pub async fn process_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MessageRequest>,
) -> ApiResult<MessageResponse> {
    let reply = state.relay.dispatch(request).await?;
    Ok(Json(MessageResponse {
        message_id: reply.message_id,
        status: "success",
        timestamp: now(),
        response: ReplyBody {
            raw_text: reply.raw_text,
        },
    }))
}

#[derive(Serialize)]
pub struct HistoryResponse {
    history: Vec<MessageEntry>,
    status: &'static str,
    timestamp: String,
}

pub async fn get_history(State(state): State<Arc<AppState>>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        history: state.relay.history(),
        status: "success",
        timestamp: now(),
    })
}

#[derive(Deserialize)]
struct HistoryImportRequest {
    history: Vec<MessageEntry>,
}

#[derive(Serialize)]
pub struct StatusMessage {
    status: &'static str,
    message: String,
    timestamp: String,
}

impl StatusMessage {
    fn success(message: String) -> Self {
        Self {
            status: "success",
            message,
            timestamp: now(),
        }
    }
}

/// The body is parsed by hand so a malformed import is reported as such
/// rather than as a generic extractor rejection.
pub async fn import_history(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<StatusMessage> {
    let request: HistoryImportRequest = serde_json::from_slice(&body)
        .map_err(|e| RelayError::MalformedImport(e.to_string()))?;

    let message = match state.relay.import_history(request.history).await? {
        ImportOutcome::Imported(count) => {
            format!("History imported successfully. {count} messages loaded.")
        }
        ImportOutcome::Cleared(summary) => format!(
            "History cleared. Unloaded {} models, {} failed",
            summary.unloaded, summary.failed
        ),
    };
    Ok(Json(StatusMessage::success(message)))
}

#[derive(Deserialize)]
pub struct TemplateRequest {
    template: String,
}

#[derive(Serialize)]
pub struct TemplateResponse {
    status: &'static str,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<String>,
}

pub async fn update_prompt_template(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TemplateRequest>,
) -> ApiResult<TemplateResponse> {
    state.relay.templates().set_template(&request.template)?;
    Ok(Json(TemplateResponse {
        status: "success",
        timestamp: now(),
        template: None,
    }))
}

pub async fn get_prompt_template(State(state): State<Arc<AppState>>) -> Json<TemplateResponse> {
    Json(TemplateResponse {
        status: "success",
        timestamp: now(),
        template: Some(state.relay.templates().get_template()),
    })
}

#[derive(Serialize)]
pub struct ModelsResponse<T> {
    models: Vec<T>,
    status: &'static str,
    timestamp: String,
}

impl<T> ModelsResponse<T> {
    fn new(models: Vec<T>) -> Self {
        Self {
            models,
            status: "success",
            timestamp: now(),
        }
    }
}

pub async fn get_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse<ModelInfo>> {
    let mut models = match state.relay.gateway().list_models().await {
        Ok(models) => models,
        Err(e) => {
            warn!("failed to get models from backend: {e}");
            Vec::new()
        }
    };

    if models.is_empty() {
        models.push(ModelInfo::named(
            state.config.inference.fallback_model.clone(),
        ));
    }
    Json(ModelsResponse::new(models))
}

pub async fn get_running_models(
    State(state): State<Arc<AppState>>,
) -> Json<ModelsResponse<RunningModel>> {
    let models = state
        .relay
        .gateway()
        .running_models()
        .await
        .unwrap_or_else(|e| {
            warn!("failed to get running models from backend: {e}");
            Vec::new()
        });
    Json(ModelsResponse::new(models))
}

pub async fn unload_model(
    State(state): State<Arc<AppState>>,
    Path(model_name): Path<String>,
) -> ApiResult<StatusMessage> {
    state.relay.gateway().unload_model(&model_name).await?;
    Ok(Json(StatusMessage::success(format!(
        "Model {model_name} unloaded successfully"
    ))))
}

pub async fn unload_all_models(State(state): State<Arc<AppState>>) -> Json<StatusMessage> {
    info!("unloading all models");
    let summary = inference::unload_all(state.relay.gateway()).await;
    Json(StatusMessage::success(format!(
        "Unloaded {} models, {} failed",
        summary.unloaded, summary.failed
    )))
}

pub async fn latest_payload(State(state): State<Arc<AppState>>) -> Response {
    match state.relay.latest_payload() {
        Some(payload) => Json::<OutboundPayload>(payload).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                detail: "no prompt has been sent yet".into(),
            }),
        )
            .into_response(),
    }
}
