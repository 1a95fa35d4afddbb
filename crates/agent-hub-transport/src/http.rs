//! HTTP adapter translating requests into `MessageService` calls.

use std::sync::Arc;

use agent_hub_session::{MessageService, ModelConfig, ModelConfigStore, ServiceError};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::protocol::{
    AckResponse, ContextRequest, ErrorResponse, ExportResponse, LoadChatsRequest,
    LoadChatsResponse, MessageRequest, MessageResponse, PauseRequest, PauseResponse, PollRequest,
    PollResponse,
};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MessageService>,
    pub models: Arc<ModelConfigStore>,
}

/// Request-level failure rendered as an `{ ok: false, message }` body.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ApiError(#[from] ServiceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Busy(_) => StatusCode::CONFLICT,
            ServiceError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            ServiceError::Agent(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorResponse {
            ok: false,
            message: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

/// Build the message API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ok", get(health).post(health))
        .route("/msg", post(msg))
        .route("/msg_sync", post(msg_sync))
        .route("/pause", post(pause))
        .route("/poll", post(poll))
        .route("/reset", post(reset))
        .route("/remove", post(remove))
        .route("/export_chat", post(export_chat))
        .route("/load_chats", post(load_chats))
        .route("/api/models", get(get_models).post(update_models))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn msg(
    State(st): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let reply = st.service.submit(&req.context, &req.text, false).await?;
    Ok(Json(MessageResponse {
        ok: true,
        message: reply.message,
        context: reply.context,
    }))
}

async fn msg_sync(
    State(st): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let reply = st.service.submit(&req.context, &req.text, true).await?;
    Ok(Json(MessageResponse {
        ok: true,
        message: reply.message,
        context: reply.context,
    }))
}

async fn pause(
    State(st): State<AppState>,
    Json(req): Json<PauseRequest>,
) -> Json<PauseResponse> {
    let reply = st.service.set_paused(&req.context, req.paused);
    let message = if reply.paused {
        "Agent paused."
    } else {
        "Agent unpaused."
    };
    Json(PauseResponse {
        ok: true,
        message: message.to_string(),
        paused: reply.paused,
    })
}

async fn poll(State(st): State<AppState>, Json(req): Json<PollRequest>) -> Json<PollResponse> {
    Json(st.service.poll(&req.context, req.log_from).into())
}

async fn reset(
    State(st): State<AppState>,
    Json(req): Json<ContextRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    st.service.reset(&req.context).await?;
    Ok(Json(AckResponse {
        ok: true,
        message: "Agent restarted.".to_string(),
    }))
}

async fn remove(
    State(st): State<AppState>,
    Json(req): Json<ContextRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    st.service.remove(&req.context).await?;
    Ok(Json(AckResponse {
        ok: true,
        message: "Context removed.".to_string(),
    }))
}

async fn export_chat(
    State(st): State<AppState>,
    Json(req): Json<ContextRequest>,
) -> Result<Json<ExportResponse>, ApiError> {
    let reply = st.service.export_chat(&req.context)?;
    Ok(Json(ExportResponse {
        ok: true,
        message: "Chat exported.".to_string(),
        context: reply.context,
        content: reply.content,
    }))
}

async fn load_chats(
    State(st): State<AppState>,
    Json(req): Json<LoadChatsRequest>,
) -> Result<Json<LoadChatsResponse>, ApiError> {
    let ctxids = st.service.import_chats(&req.chats).await?;
    Ok(Json(LoadChatsResponse {
        ok: true,
        message: "Chats loaded.".to_string(),
        ctxids,
    }))
}

async fn get_models(State(st): State<AppState>) -> Result<Json<ModelConfig>, ApiError> {
    let config = st.models.load().await.map_err(ServiceError::Storage)?;
    Ok(Json(config))
}

async fn update_models(
    State(st): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<AckResponse>, ApiError> {
    // all three model keys are required; a partial body is a caller bug
    let config: ModelConfig = serde_json::from_value(body)
        .map_err(|e| ServiceError::Validation(format!("missing model parameters: {e}")))?;
    st.models.save(&config).await.map_err(ServiceError::Storage)?;
    Ok(Json(AckResponse {
        ok: true,
        message: "Models updated.".to_string(),
    }))
}
