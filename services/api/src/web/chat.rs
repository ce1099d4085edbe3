//! services/api/src/web/chat.rs
//!
//! Tutoring chat endpoints: one chat turn, the list of past conversations,
//! and a single conversation fetch.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use tutor_core::domain::{ChatHistory, ChatMessage, User, XpAward};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    pub topic: String,
    pub chat_id: Option<Uuid>,
}

#[derive(Serialize, ToSchema)]
pub struct ChatTurnResponse {
    pub chat_id: Uuid,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct ChatMessageResponse {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ChatMessage> for ChatMessageResponse {
    fn from(msg: ChatMessage) -> Self {
        Self {
            role: match msg.role {
                tutor_core::domain::MessageRole::User => "user".to_string(),
                tutor_core::domain::MessageRole::Assistant => "assistant".to_string(),
            },
            content: msg.content,
            timestamp: msg.timestamp,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ChatHistoryResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic: String,
    pub messages: Vec<ChatMessageResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<ChatHistory> for ChatHistoryResponse {
    fn from(chat: ChatHistory) -> Self {
        Self {
            id: chat.id,
            user_id: chat.user_id,
            topic: chat.topic,
            messages: chat.messages.into_iter().map(Into::into).collect(),
            created_at: chat.created_at,
        }
    }
}

fn internal(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/chat - Run one tutoring chat turn.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply for this turn", body = ChatTurnResponse),
        (status = 401, description = "Not authenticated"),
        (status = 503, description = "AI service not configured"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatTurnResponse>, (StatusCode, String)> {
    // Fail before touching the database when no LLM credential is configured.
    let tutor = state.tutor.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        "AI service not configured".to_string(),
    ))?;

    // 1. Resolve the conversation: load by id if given, else start a fresh one.
    let existing = match req.chat_id {
        Some(chat_id) => state.db.find_chat(chat_id).await.map_err(internal)?,
        None => None,
    };
    let mut chat = match existing {
        Some(chat) => chat,
        None => state
            .db
            .create_chat(user.id, &req.topic)
            .await
            .map_err(internal)?,
    };

    // 2. Append the user's message.
    chat.append_user_message(req.message, Utc::now());

    // 3-4. Replay the full history to the LLM and wait for the completion.
    let reply = tutor
        .reply(&req.topic, &chat.messages)
        .await
        .map_err(|e| {
            error!("Chat error: {:?}", e);
            internal(e)
        })?;

    // 5-6. Append the assistant's message and persist the whole sequence.
    // Concurrent turns on the same chat race here; last writer wins.
    let answered_at = Utc::now();
    chat.append_assistant_message(reply.clone(), answered_at);
    state
        .db
        .update_chat_messages(chat.id, &chat.messages)
        .await
        .map_err(internal)?;

    // 7. Credit the ledger. The turn already succeeded, so a ledger failure
    //    is logged but not reported to the caller.
    if let Err(e) = credit_progress(
        &state,
        user.id,
        &XpAward::ChatTurn {
            topic: req.topic.clone(),
        },
    )
    .await
    {
        error!("Failed to update progress after chat turn: {:?}", e);
    }

    Ok(Json(ChatTurnResponse {
        chat_id: chat.id,
        response: reply,
        timestamp: answered_at,
    }))
}

/// Applies one award to the user's ledger, if a ledger exists.
pub(crate) async fn credit_progress(
    state: &AppState,
    user_id: Uuid,
    award: &XpAward,
) -> tutor_core::ports::PortResult<()> {
    if let Some(mut progress) = state.db.find_progress(user_id).await? {
        progress.credit(award, Utc::now());
        state.db.update_progress(&progress).await?;
    }
    Ok(())
}

/// GET /api/chat/history - All of the caller's conversations, newest first.
#[utoipa::path(
    get,
    path = "/api/chat/history",
    responses(
        (status = 200, description = "Chat histories, newest first", body = [ChatHistoryResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn chat_history_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<ChatHistoryResponse>>, (StatusCode, String)> {
    let chats = state
        .db
        .list_chats_for_user(user.id)
        .await
        .map_err(internal)?;
    Ok(Json(chats.into_iter().map(Into::into).collect()))
}

/// GET /api/chat/{chat_id} - One conversation, only if the caller owns it.
#[utoipa::path(
    get,
    path = "/api/chat/{chat_id}",
    params(("chat_id" = Uuid, Path, description = "The conversation id")),
    responses(
        (status = 200, description = "The conversation", body = ChatHistoryResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Chat not found")
    )
)]
pub async fn get_chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<ChatHistoryResponse>, (StatusCode, String)> {
    let chat = state
        .db
        .find_chat_for_user(chat_id, user.id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Chat not found".to_string()))?;
    Ok(Json(chat.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::testing::{sample_user, test_state, FakeDb};
    use tutor_core::ports::DatabaseService;

    #[tokio::test]
    async fn chat_owned_by_another_user_is_not_found() {
        let db = Arc::new(FakeDb::default());
        let owner = sample_user();
        let stranger = sample_user();
        let chat = db.create_chat(owner.id, "math").await.unwrap();
        let state = test_state(db);

        let err = get_chat_handler(
            State(state.clone()),
            Extension(stranger),
            Path(chat.id),
        )
        .await
        .err()
        .expect("another user's chat must not resolve");
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        // The owner still sees their own conversation.
        let Json(found) = get_chat_handler(State(state), Extension(owner), Path(chat.id))
            .await
            .unwrap();
        assert_eq!(found.id, chat.id);
        assert_eq!(found.topic, "math");
    }

    #[tokio::test]
    async fn unknown_chat_id_is_not_found() {
        let db = Arc::new(FakeDb::default());
        let user = sample_user();
        let state = test_state(db);

        let err = get_chat_handler(State(state), Extension(user), Path(Uuid::new_v4()))
            .await
            .err()
            .unwrap();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn history_listing_only_contains_the_callers_chats() {
        let db = Arc::new(FakeDb::default());
        let owner = sample_user();
        let stranger = sample_user();
        db.create_chat(owner.id, "math").await.unwrap();
        db.create_chat(stranger.id, "history").await.unwrap();
        let state = test_state(db);

        let Json(chats) = chat_history_handler(State(state), Extension(owner.clone()))
            .await
            .unwrap();
        assert_eq!(chats.len(), 1);
        assert!(chats.iter().all(|chat| chat.user_id == owner.id));
    }
}
