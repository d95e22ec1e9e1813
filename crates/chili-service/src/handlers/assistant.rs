//! Business assistant handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use chili_gemini::ChatTurn;

use crate::auth::SessionAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Transcript response.
#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    /// All entries, greeting first.
    pub messages: Vec<ChatTurn>,
}

/// Get the session's assistant transcript.
pub async fn get_transcript(auth: SessionAuth) -> Json<TranscriptResponse> {
    let chat = auth.session.assistant.lock().await;
    Json(TranscriptResponse {
        messages: chat.turns().to_vec(),
    })
}

/// Send-message request body.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// The user's message.
    pub message: String,
}

/// Reply response.
#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    /// The assistant's reply.
    pub reply: ChatTurn,
}

/// Send a message to the assistant.
///
/// Messages from one session are answered one at a time.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    auth: SessionAuth,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ReplyResponse>, ApiError> {
    let assistant = state
        .assistant
        .as_ref()
        .ok_or_else(|| ApiError::NotConfigured("Gemini".into()))?;

    let mut chat = auth.session.assistant.lock().await;
    let reply = assistant.send(&mut chat, &request.message).await?;

    Ok(Json(ReplyResponse { reply }))
}
