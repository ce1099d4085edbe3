//! services/api/src/web/quiz.rs
//!
//! Quiz endpoints: generation (stateless), submission, and past results.

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use tutor_core::domain::{QuizQuestion, QuizResult, User, XpAward};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::chat::credit_progress;
use crate::web::state::AppState;

fn default_num_questions() -> u32 {
    5
}

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct QuizRequest {
    pub topic: String,
    #[serde(default = "default_num_questions")]
    pub num_questions: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct SaveQuizRequest {
    pub topic: String,
    pub score: i32,
    pub total: i32,
    /// Stored verbatim, whatever shape the client submitted.
    #[schema(value_type = Vec<Object>)]
    pub questions: Vec<serde_json::Value>,
}

#[derive(Serialize, ToSchema)]
pub struct QuizQuestionResponse {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
}

impl From<QuizQuestion> for QuizQuestionResponse {
    fn from(q: QuizQuestion) -> Self {
        Self {
            question: q.question,
            options: q.options,
            correct_answer: q.correct_answer,
            explanation: q.explanation,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct GeneratedQuizResponse {
    pub topic: String,
    pub questions: Vec<QuizQuestionResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct SaveQuizResponse {
    pub message: String,
    pub xp_earned: i64,
}

#[derive(Serialize, ToSchema)]
pub struct QuizResultResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic: String,
    pub score: i32,
    pub total: i32,
    #[schema(value_type = Vec<Object>)]
    pub questions: Vec<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<QuizResult> for QuizResultResponse {
    fn from(result: QuizResult) -> Self {
        Self {
            id: result.id,
            user_id: result.user_id,
            topic: result.topic,
            score: result.score,
            total: result.total,
            questions: result.questions,
            created_at: result.created_at,
        }
    }
}

fn internal(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/quiz/generate - Generate quiz questions for a topic.
///
/// Nothing is persisted here; only /api/quiz/save records an outcome.
#[utoipa::path(
    post,
    path = "/api/quiz/generate",
    request_body = QuizRequest,
    responses(
        (status = 200, description = "Generated questions", body = GeneratedQuizResponse),
        (status = 401, description = "Not authenticated"),
        (status = 503, description = "AI service not configured"),
        (status = 500, description = "Generation or parse failure")
    )
)]
pub async fn generate_quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(_user): Extension<User>,
    Json(req): Json<QuizRequest>,
) -> Result<Json<GeneratedQuizResponse>, (StatusCode, String)> {
    let generator = state.quiz_generator.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        "AI service not configured".to_string(),
    ))?;

    let questions = generator
        .generate_questions(&req.topic, req.num_questions)
        .await
        .map_err(|e| {
            error!("Quiz generation error: {:?}", e);
            internal(e)
        })?;

    Ok(Json(GeneratedQuizResponse {
        topic: req.topic,
        questions: questions.into_iter().map(Into::into).collect(),
    }))
}

/// POST /api/quiz/save - Record a quiz outcome and credit the ledger.
#[utoipa::path(
    post,
    path = "/api/quiz/save",
    request_body = SaveQuizRequest,
    responses(
        (status = 200, description = "Result saved", body = SaveQuizResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn save_quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<SaveQuizRequest>,
) -> Result<Json<SaveQuizResponse>, (StatusCode, String)> {
    state
        .db
        .insert_quiz_result(user.id, &req.topic, req.score, req.total, &req.questions)
        .await
        .map_err(internal)?;

    let award = XpAward::QuizScore { correct: req.score };
    let xp_earned = award.xp();
    // Quiz topics deliberately do not join topics_learned; only chat turns do.
    if let Err(e) = credit_progress(&state, user.id, &award).await {
        error!("Failed to update progress after quiz save: {:?}", e);
    }

    Ok(Json(SaveQuizResponse {
        message: "Quiz result saved".to_string(),
        xp_earned,
    }))
}

/// GET /api/quiz/results - The caller's quiz results, newest first.
#[utoipa::path(
    get,
    path = "/api/quiz/results",
    responses(
        (status = 200, description = "Quiz results, newest first", body = [QuizResultResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn quiz_results_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<QuizResultResponse>>, (StatusCode, String)> {
    let results = state
        .db
        .list_quiz_results(user.id)
        .await
        .map_err(internal)?;
    Ok(Json(results.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::testing::{sample_user, test_state, FakeDb};
    use tutor_core::ports::DatabaseService;

    #[tokio::test]
    async fn save_persists_one_result_and_credits_the_ledger() {
        let db = Arc::new(FakeDb::default());
        let user = sample_user();
        db.create_progress(user.id).await.unwrap();
        let state = test_state(db.clone());

        let req = SaveQuizRequest {
            topic: "physics".to_string(),
            score: 3,
            total: 5,
            questions: vec![serde_json::json!({"question": "Q?", "options": ["a", "b"]})],
        };
        let Json(response) = save_quiz_handler(State(state), Extension(user.clone()), Json(req))
            .await
            .unwrap();
        assert_eq!(response.xp_earned, 60);

        let stored = db.quiz_results.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].user_id, user.id);
        assert_eq!(stored[0].score, 3);
        assert_eq!(stored[0].total, 5);
        drop(stored);

        let ledgers = db.progress.lock().unwrap();
        let progress = ledgers.get(&user.id).unwrap();
        assert_eq!(progress.xp_points, 60);
        // Quiz topics stay out of topics_learned.
        assert!(progress.topics_learned.is_empty());
    }

    #[tokio::test]
    async fn save_without_a_ledger_still_records_the_result() {
        let db = Arc::new(FakeDb::default());
        let user = sample_user();
        let state = test_state(db.clone());

        let req = SaveQuizRequest {
            topic: "art".to_string(),
            score: 1,
            total: 5,
            questions: Vec::new(),
        };
        let Json(response) = save_quiz_handler(State(state), Extension(user), Json(req))
            .await
            .unwrap();
        assert_eq!(response.xp_earned, 20);
        assert_eq!(db.quiz_results.lock().unwrap().len(), 1);
    }
}
