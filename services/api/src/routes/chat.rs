//! FAQ chatbot route

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::chatbot;
use crate::state::AppState;

/// Request for the chatbot
#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

/// Answer a question: local FAQ first, the upstream model next, and a
/// canned reply when the upstream is unreachable. Upstream failures never
/// surface as errors to the caller.
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> impl IntoResponse {
    if payload.message.trim().is_empty() {
        return Json(json!({"reply": "Please type a question."}));
    }

    if let Some(answer) = chatbot::local_answer(&payload.message) {
        return Json(json!({"reply": answer}));
    }

    let reply = match chatbot::upstream_answer(&state.http_client, &state.chat, &payload.message)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Chat upstream call failed: {}", e);
            chatbot::UNAVAILABLE_REPLY.to_string()
        }
    };

    Json(json!({"reply": reply}))
}
