//! crates/tutor_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    ChatHistory, ChatMessage, IdentityProfile, Progress, QuizQuestion, QuizResult, Session, User,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>>;

    async fn find_user_by_id(&self, user_id: Uuid) -> PortResult<Option<User>>;

    async fn create_user(&self, profile: &IdentityProfile) -> PortResult<User>;

    async fn update_user_interests(&self, user_id: Uuid, interests: &[String]) -> PortResult<()>;

    // --- Session Management ---
    async fn create_session(
        &self,
        session_token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn find_session(&self, session_token: &str) -> PortResult<Option<Session>>;

    async fn delete_session(&self, session_token: &str) -> PortResult<()>;

    // --- Chat History ---
    async fn create_chat(&self, user_id: Uuid, topic: &str) -> PortResult<ChatHistory>;

    async fn find_chat(&self, chat_id: Uuid) -> PortResult<Option<ChatHistory>>;

    async fn find_chat_for_user(
        &self,
        chat_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<Option<ChatHistory>>;

    /// Writes back the whole message sequence for a chat (upsert by id).
    /// Concurrent writers race on this read-modify-write; last writer wins.
    async fn update_chat_messages(
        &self,
        chat_id: Uuid,
        messages: &[ChatMessage],
    ) -> PortResult<()>;

    /// All chats for a user, newest first.
    async fn list_chats_for_user(&self, user_id: Uuid) -> PortResult<Vec<ChatHistory>>;

    // --- Quiz Results ---
    async fn insert_quiz_result(
        &self,
        user_id: Uuid,
        topic: &str,
        score: i32,
        total: i32,
        questions: &[serde_json::Value],
    ) -> PortResult<QuizResult>;

    /// All quiz results for a user, newest first.
    async fn list_quiz_results(&self, user_id: Uuid) -> PortResult<Vec<QuizResult>>;

    // --- Progress Ledger ---
    async fn find_progress(&self, user_id: Uuid) -> PortResult<Option<Progress>>;

    /// Inserts a zeroed progress record for the user.
    async fn create_progress(&self, user_id: Uuid) -> PortResult<Progress>;

    /// Persists the ledger fields (xp, topics, last activity) for the user.
    async fn update_progress(&self, progress: &Progress) -> PortResult<()>;
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Exchanges an opaque session id with the external identity provider for
    /// the caller's profile and a session token.
    ///
    /// A rejection by the provider surfaces as `PortError::InvalidRequest`;
    /// transport failures surface as `PortError::Unexpected`.
    async fn exchange_session(&self, session_id: &str) -> PortResult<IdentityProfile>;
}

#[async_trait]
pub trait TutorChatService: Send + Sync {
    /// Produces the assistant's reply for one chat turn, given the topic and
    /// the full conversation so far (role-preserving replay).
    async fn reply(&self, topic: &str, history: &[ChatMessage]) -> PortResult<String>;
}

#[async_trait]
pub trait QuizGenerationService: Send + Sync {
    /// Generates `num_questions` multiple-choice questions on a topic.
    async fn generate_questions(
        &self,
        topic: &str,
        num_questions: u32,
    ) -> PortResult<Vec<QuizQuestion>>;
}

#[async_trait]
pub trait SummarizationService: Send + Sync {
    /// Summarizes arbitrary content in under 150 words.
    async fn summarize(&self, content: &str) -> PortResult<String>;
}
