use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use maitred_agent::conversation::ChatMessage;
use maitred_agent::runtime::AgentRuntime;

/// Thin HTTP seam in front of the orchestrator. The chat UI proper lives
/// elsewhere and is expected to submit each logical user message at most
/// once; this endpoint just runs one turn per request.
#[derive(Clone)]
pub struct ChatState {
    runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub correlation_id: String,
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new().route("/chat", post(chat)).with_state(ChatState { runtime })
}

pub async fn chat(
    State(state): State<ChatState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    // The guest id only reaches the model through the conversation, so pin
    // it at the top of the history the pipeline sees.
    let mut history = Vec::with_capacity(request.history.len() + 1);
    history.push(ChatMessage::assistant(format!("(guest profile id: {})", request.user_id)));
    history.extend(request.history);

    let turn = state.runtime.handle_message(&request.message, &history).await;

    info!(
        event_name = "chat.turn_completed",
        correlation_id = %turn.correlation_id,
        user_id = %request.user_id,
        "chat turn completed"
    );

    Json(ChatResponse { reply: turn.reply, correlation_id: turn.correlation_id })
}
