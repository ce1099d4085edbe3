//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tutor_core::domain::{
    ChatHistory, ChatMessage, IdentityProfile, Progress, QuizResult, Session, User,
};
use tutor_core::ports::{DatabaseService, PortError, PortResult};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    name: String,
    picture: Option<String>,
    learning_interests: Vec<String>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            picture: self.picture,
            learning_interests: self.learning_interests,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    session_token: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> Session {
        Session {
            session_token: self.session_token,
            user_id: self.user_id,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ChatHistoryRecord {
    id: Uuid,
    user_id: Uuid,
    topic: String,
    messages: Json<Vec<ChatMessage>>,
    created_at: DateTime<Utc>,
}
impl ChatHistoryRecord {
    fn to_domain(self) -> ChatHistory {
        ChatHistory {
            id: self.id,
            user_id: self.user_id,
            topic: self.topic,
            messages: self.messages.0,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct QuizResultRecord {
    id: Uuid,
    user_id: Uuid,
    topic: String,
    score: i32,
    total: i32,
    questions: Json<Vec<serde_json::Value>>,
    created_at: DateTime<Utc>,
}
impl QuizResultRecord {
    fn to_domain(self) -> QuizResult {
        QuizResult {
            id: self.id,
            user_id: self.user_id,
            topic: self.topic,
            score: self.score,
            total: self.total,
            questions: self.questions.0,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ProgressRecord {
    id: Uuid,
    user_id: Uuid,
    xp_points: i64,
    topics_learned: Vec<String>,
    learning_streak: i32,
    last_activity: DateTime<Utc>,
}
impl ProgressRecord {
    fn to_domain(self) -> Progress {
        Progress {
            id: self.id,
            user_id: self.user_id,
            xp_points: self.xp_points,
            topics_learned: self.topics_learned,
            learning_streak: self.learning_streak,
            last_activity: self.last_activity,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

const USER_COLUMNS: &str = "id, email, name, picture, learning_interests, created_at";
const CHAT_COLUMNS: &str = "id, user_id, topic, messages, created_at";
const QUIZ_COLUMNS: &str = "id, user_id, topic, score, total, questions, created_at";
const PROGRESS_COLUMNS: &str =
    "id, user_id, xp_points, topics_learned, learning_streak, last_activity";

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn create_user(&self, profile: &IdentityProfile) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (email, name, picture, learning_interests) \
             VALUES ($1, $2, $3, '{{}}') RETURNING {USER_COLUMNS}"
        ))
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(&profile.picture)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn update_user_interests(&self, user_id: Uuid, interests: &[String]) -> PortResult<()> {
        sqlx::query("UPDATE users SET learning_interests = $1 WHERE id = $2")
            .bind(interests)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_session(
        &self,
        session_token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO sessions (session_token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn find_session(&self, session_token: &str) -> PortResult<Option<Session>> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT session_token, user_id, expires_at, created_at FROM sessions \
             WHERE session_token = $1",
        )
        .bind(session_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(SessionRecord::to_domain))
    }

    async fn delete_session(&self, session_token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM sessions WHERE session_token = $1")
            .bind(session_token)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_chat(&self, user_id: Uuid, topic: &str) -> PortResult<ChatHistory> {
        let record = sqlx::query_as::<_, ChatHistoryRecord>(&format!(
            "INSERT INTO chat_histories (user_id, topic, messages) \
             VALUES ($1, $2, '[]') RETURNING {CHAT_COLUMNS}"
        ))
        .bind(user_id)
        .bind(topic)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn find_chat(&self, chat_id: Uuid) -> PortResult<Option<ChatHistory>> {
        let record = sqlx::query_as::<_, ChatHistoryRecord>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chat_histories WHERE id = $1"
        ))
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(ChatHistoryRecord::to_domain))
    }

    async fn find_chat_for_user(
        &self,
        chat_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<Option<ChatHistory>> {
        let record = sqlx::query_as::<_, ChatHistoryRecord>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chat_histories WHERE id = $1 AND user_id = $2"
        ))
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(ChatHistoryRecord::to_domain))
    }

    async fn update_chat_messages(
        &self,
        chat_id: Uuid,
        messages: &[ChatMessage],
    ) -> PortResult<()> {
        sqlx::query("UPDATE chat_histories SET messages = $1 WHERE id = $2")
            .bind(Json(messages))
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn list_chats_for_user(&self, user_id: Uuid) -> PortResult<Vec<ChatHistory>> {
        let records = sqlx::query_as::<_, ChatHistoryRecord>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chat_histories WHERE user_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(ChatHistoryRecord::to_domain).collect())
    }

    async fn insert_quiz_result(
        &self,
        user_id: Uuid,
        topic: &str,
        score: i32,
        total: i32,
        questions: &[serde_json::Value],
    ) -> PortResult<QuizResult> {
        let record = sqlx::query_as::<_, QuizResultRecord>(&format!(
            "INSERT INTO quiz_results (user_id, topic, score, total, questions) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {QUIZ_COLUMNS}"
        ))
        .bind(user_id)
        .bind(topic)
        .bind(score)
        .bind(total)
        .bind(Json(questions))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_quiz_results(&self, user_id: Uuid) -> PortResult<Vec<QuizResult>> {
        let records = sqlx::query_as::<_, QuizResultRecord>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quiz_results WHERE user_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(QuizResultRecord::to_domain).collect())
    }

    async fn find_progress(&self, user_id: Uuid) -> PortResult<Option<Progress>> {
        let record = sqlx::query_as::<_, ProgressRecord>(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(ProgressRecord::to_domain))
    }

    async fn create_progress(&self, user_id: Uuid) -> PortResult<Progress> {
        let record = sqlx::query_as::<_, ProgressRecord>(&format!(
            "INSERT INTO progress (user_id) VALUES ($1) RETURNING {PROGRESS_COLUMNS}"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn update_progress(&self, progress: &Progress) -> PortResult<()> {
        sqlx::query(
            "UPDATE progress SET xp_points = $1, topics_learned = $2, last_activity = $3 \
             WHERE user_id = $4",
        )
        .bind(progress.xp_points)
        .bind(&progress.topics_learned)
        .bind(progress.last_activity)
        .bind(progress.user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }
}
