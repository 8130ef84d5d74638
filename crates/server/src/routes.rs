//! HTTP routes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use agent::{ChatAgent, GeminiBackend, History, SessionId};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;
use uuid::Uuid;

use crate::context::ContextBuilder;

/// Shared application state.
///
/// Histories are keyed by session and locked per session, so concurrent
/// requests on different sessions never share conversation state.
pub struct AppState {
    pub agent: ChatAgent<GeminiBackend, mcp::Client>,
    pub context: ContextBuilder,
    pub sessions: Mutex<HashMap<SessionId, Arc<tokio::sync::Mutex<History>>>>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/chat", post(chat))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

/// Input payload for the chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Omit to start a new session.
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

/// Output payload.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub session_id: Uuid,
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ApiError::EmptyMessage);
    }

    let session_id = payload.session_id.map(SessionId).unwrap_or_default();
    let history = {
        let mut sessions = state
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sessions
            .entry(session_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(History::new())))
            .clone()
    };
    let mut history = history.lock().await;

    let prompt = state.context.expand(message).await;
    let reply = state
        .agent
        .answer(&mut history, &prompt)
        .await
        .map_err(|e| {
            error!(session = %session_id, error = %e, "chat run failed");
            ApiError::Run
        })?;

    Ok(Json(ChatResponse {
        reply,
        session_id: session_id.0,
    }))
}

enum ApiError {
    EmptyMessage,
    Run,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::EmptyMessage => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "message cannot be empty"})),
            )
                .into_response(),
            ApiError::Run => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "unexpected server error",
                    "details": "please try again later"
                })),
            )
                .into_response(),
        }
    }
}
