use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tourbook_agent::ChatReply;
use tourbook_core::errors::ApplicationError;
use tracing::debug;

use crate::error::ApiError;
use crate::routes::AppState;

pub const MESSAGE_REQUIRED: &str = "Message is required and must be a string";

/// Chat body. Fields stay loosely typed so a wrong type is reported with the
/// same client message as a missing one.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Value,
    #[serde(default)]
    pub session_id: Value,
    #[serde(default)]
    pub context: Value,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(flatten)]
    pub reply: ChatReply,
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Ok(Json(request)) = payload else {
        return Err(ApiError::bad_request(MESSAGE_REQUIRED));
    };

    let message = request
        .message
        .as_str()
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .ok_or_else(|| ApiError::bad_request(MESSAGE_REQUIRED))?;

    if !request.context.is_null() {
        debug!(event_name = "chat.context.ignored", "client context is not used for filtering");
    }

    let session_id = session_key(&request.session_id);
    let reply = state
        .agent
        .handle_chat(message, session_id.as_deref())
        .await
        .map_err(|e| ApplicationError::Integration(e.to_string()))?;

    Ok(Json(ChatResponse { success: true, reply }))
}

/// Numeric ids key the same session as their decimal text.
fn session_key(raw: &Value) -> Option<String> {
    match raw {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
