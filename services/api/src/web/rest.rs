//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for summarization, the progress ledger, and the
//! topic catalog, plus the master definition for the OpenAPI specification.

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use tutor_core::domain::{Progress, User, XpAward};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::chat::credit_progress;
use crate::web::state::AppState;
use crate::web::{auth, chat, quiz};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::process_session_handler,
        auth::me_handler,
        auth::logout_handler,
        auth::update_interests_handler,
        chat::chat_handler,
        chat::chat_history_handler,
        chat::get_chat_handler,
        quiz::generate_quiz_handler,
        quiz::save_quiz_handler,
        quiz::quiz_results_handler,
        summarize_handler,
        progress_handler,
        topics_handler,
    ),
    components(
        schemas(
            auth::SessionDataRequest,
            auth::UpdateInterestsRequest,
            auth::UserResponse,
            auth::SessionResponse,
            auth::MessageResponse,
            chat::ChatRequest,
            chat::ChatTurnResponse,
            chat::ChatMessageResponse,
            chat::ChatHistoryResponse,
            quiz::QuizRequest,
            quiz::SaveQuizRequest,
            quiz::QuizQuestionResponse,
            quiz::GeneratedQuizResponse,
            quiz::SaveQuizResponse,
            quiz::QuizResultResponse,
            SummaryRequest,
            SummaryResponse,
            ProgressResponse,
            TopicEntry,
            TopicsResponse,
        )
    ),
    tags(
        (name = "AI Tutor API", description = "API endpoints for the AI-assisted learning app.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SummaryRequest {
    pub content: String,
}

#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Serialize, ToSchema)]
pub struct ProgressResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub xp_points: i64,
    pub topics_learned: Vec<String>,
    pub learning_streak: i32,
    pub last_activity: DateTime<Utc>,
}

impl From<Progress> for ProgressResponse {
    fn from(progress: Progress) -> Self {
        Self {
            id: progress.id,
            user_id: progress.user_id,
            xp_points: progress.xp_points,
            topics_learned: progress.topics_learned,
            learning_streak: progress.learning_streak,
            last_activity: progress.last_activity,
        }
    }
}

#[derive(Serialize, Clone, Copy, ToSchema)]
pub struct TopicEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
}

#[derive(Serialize, ToSchema)]
pub struct TopicsResponse {
    pub topics: Vec<TopicEntry>,
}

/// The fixed catalog of tutoring topics offered by the app.
pub const TOPIC_CATALOG: [TopicEntry; 8] = [
    TopicEntry { id: "math", name: "Mathematics", icon: "calculator" },
    TopicEntry { id: "python", name: "Python Programming", icon: "code" },
    TopicEntry { id: "biology", name: "Biology", icon: "leaf" },
    TopicEntry { id: "english", name: "English", icon: "book-open" },
    TopicEntry { id: "history", name: "History", icon: "landmark" },
    TopicEntry { id: "physics", name: "Physics", icon: "atom" },
    TopicEntry { id: "chemistry", name: "Chemistry", icon: "flask" },
    TopicEntry { id: "art", name: "Art & Design", icon: "palette" },
];

fn internal(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// POST /api/summarize - Summarize arbitrary content.
///
/// The summary text itself is not persisted; only the ledger is credited.
#[utoipa::path(
    post,
    path = "/api/summarize",
    request_body = SummaryRequest,
    responses(
        (status = 200, description = "The summary", body = SummaryResponse),
        (status = 401, description = "Not authenticated"),
        (status = 503, description = "AI service not configured"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn summarize_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, (StatusCode, String)> {
    let summarizer = state.summarizer.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        "AI service not configured".to_string(),
    ))?;

    let summary = summarizer.summarize(&req.content).await.map_err(|e| {
        error!("Summarization error: {:?}", e);
        internal(e)
    })?;

    if let Err(e) = credit_progress(&state, user.id, &XpAward::Summary).await {
        error!("Failed to update progress after summary: {:?}", e);
    }

    Ok(Json(SummaryResponse { summary }))
}

/// GET /api/progress - The caller's progress ledger, created lazily if absent.
#[utoipa::path(
    get,
    path = "/api/progress",
    responses(
        (status = 200, description = "The progress ledger", body = ProgressResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<ProgressResponse>, (StatusCode, String)> {
    let progress = match state.db.find_progress(user.id).await.map_err(internal)? {
        Some(progress) => progress,
        None => state.db.create_progress(user.id).await.map_err(internal)?,
    };
    Ok(Json(progress.into()))
}

/// GET /api/topics - The static topic catalog. No authentication required.
#[utoipa::path(
    get,
    path = "/api/topics",
    responses(
        (status = 200, description = "The topic catalog", body = TopicsResponse)
    )
)]
pub async fn topics_handler() -> Json<TopicsResponse> {
    Json(TopicsResponse {
        topics: TOPIC_CATALOG.to_vec(),
    })
}
