//! services/api/src/web/testing.rs
//!
//! In-memory fakes for the service ports, shared by the middleware and
//! handler tests. Only the lookups the tests exercise are implemented; the
//! rest panic loudly if reached.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tutor_core::domain::{
    ChatHistory, ChatMessage, IdentityProfile, Progress, QuizResult, Session, User,
};
use tutor_core::ports::{DatabaseService, IdentityService, PortError, PortResult};
use uuid::Uuid;

use crate::config::Config;
use crate::web::state::AppState;

/// An in-memory stand-in for the Postgres adapter.
#[derive(Default)]
pub struct FakeDb {
    pub sessions: Mutex<HashMap<String, Session>>,
    pub users: Mutex<HashMap<Uuid, User>>,
    pub chats: Mutex<HashMap<Uuid, ChatHistory>>,
    pub quiz_results: Mutex<Vec<QuizResult>>,
    pub progress: Mutex<HashMap<Uuid, Progress>>,
}

impl FakeDb {
    pub fn with_user(self, user: User) -> Self {
        self.users.lock().unwrap().insert(user.id, user);
        self
    }

    pub fn with_session(self, token: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        self.sessions.lock().unwrap().insert(
            token.to_string(),
            Session {
                session_token: token.to_string(),
                user_id,
                expires_at,
                created_at: Utc::now(),
            },
        );
        self
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

pub fn sample_user() -> User {
    User {
        id: Uuid::new_v4(),
        email: "learner@example.com".to_string(),
        name: "Learner".to_string(),
        picture: None,
        learning_interests: Vec::new(),
        created_at: Utc::now(),
    }
}

#[async_trait]
impl DatabaseService for FakeDb {
    async fn find_user_by_email(&self, _email: &str) -> PortResult<Option<User>> {
        unimplemented!()
    }
    async fn find_user_by_id(&self, user_id: Uuid) -> PortResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }
    async fn create_user(&self, _profile: &IdentityProfile) -> PortResult<User> {
        unimplemented!()
    }
    async fn update_user_interests(&self, _user_id: Uuid, _interests: &[String]) -> PortResult<()> {
        unimplemented!()
    }
    async fn create_session(
        &self,
        _session_token: &str,
        _user_id: Uuid,
        _expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        unimplemented!()
    }
    async fn find_session(&self, session_token: &str) -> PortResult<Option<Session>> {
        Ok(self.sessions.lock().unwrap().get(session_token).cloned())
    }
    async fn delete_session(&self, session_token: &str) -> PortResult<()> {
        self.sessions.lock().unwrap().remove(session_token);
        Ok(())
    }
    async fn create_chat(&self, user_id: Uuid, topic: &str) -> PortResult<ChatHistory> {
        let chat = ChatHistory {
            id: Uuid::new_v4(),
            user_id,
            topic: topic.to_string(),
            messages: Vec::new(),
            created_at: Utc::now(),
        };
        self.chats.lock().unwrap().insert(chat.id, chat.clone());
        Ok(chat)
    }
    async fn find_chat(&self, chat_id: Uuid) -> PortResult<Option<ChatHistory>> {
        Ok(self.chats.lock().unwrap().get(&chat_id).cloned())
    }
    async fn find_chat_for_user(
        &self,
        chat_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<Option<ChatHistory>> {
        Ok(self
            .chats
            .lock()
            .unwrap()
            .get(&chat_id)
            .filter(|chat| chat.user_id == user_id)
            .cloned())
    }
    async fn update_chat_messages(
        &self,
        chat_id: Uuid,
        messages: &[ChatMessage],
    ) -> PortResult<()> {
        if let Some(chat) = self.chats.lock().unwrap().get_mut(&chat_id) {
            chat.messages = messages.to_vec();
        }
        Ok(())
    }
    async fn list_chats_for_user(&self, user_id: Uuid) -> PortResult<Vec<ChatHistory>> {
        let mut chats: Vec<ChatHistory> = self
            .chats
            .lock()
            .unwrap()
            .values()
            .filter(|chat| chat.user_id == user_id)
            .cloned()
            .collect();
        chats.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(chats)
    }
    async fn insert_quiz_result(
        &self,
        user_id: Uuid,
        topic: &str,
        score: i32,
        total: i32,
        questions: &[serde_json::Value],
    ) -> PortResult<QuizResult> {
        let result = QuizResult {
            id: Uuid::new_v4(),
            user_id,
            topic: topic.to_string(),
            score,
            total,
            questions: questions.to_vec(),
            created_at: Utc::now(),
        };
        self.quiz_results.lock().unwrap().push(result.clone());
        Ok(result)
    }
    async fn list_quiz_results(&self, user_id: Uuid) -> PortResult<Vec<QuizResult>> {
        let mut results: Vec<QuizResult> = self
            .quiz_results
            .lock()
            .unwrap()
            .iter()
            .filter(|result| result.user_id == user_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }
    async fn find_progress(&self, user_id: Uuid) -> PortResult<Option<Progress>> {
        Ok(self.progress.lock().unwrap().get(&user_id).cloned())
    }
    async fn create_progress(&self, user_id: Uuid) -> PortResult<Progress> {
        let progress = Progress {
            id: Uuid::new_v4(),
            user_id,
            xp_points: 0,
            topics_learned: Vec::new(),
            learning_streak: 0,
            last_activity: Utc::now(),
        };
        self.progress.lock().unwrap().insert(user_id, progress.clone());
        Ok(progress)
    }
    async fn update_progress(&self, progress: &Progress) -> PortResult<()> {
        self.progress
            .lock()
            .unwrap()
            .insert(progress.user_id, progress.clone());
        Ok(())
    }
}

/// An identity port that is never expected to be called.
pub struct NullIdentity;

#[async_trait]
impl IdentityService for NullIdentity {
    async fn exchange_session(&self, _session_id: &str) -> PortResult<IdentityProfile> {
        Err(PortError::Unexpected(
            "identity exchange not wired in tests".to_string(),
        ))
    }
}

/// Builds an `AppState` around the given fake database, with no LLM adapters.
pub fn test_state(db: Arc<FakeDb>) -> Arc<AppState> {
    let config = Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: String::new(),
        log_level: tracing::Level::INFO,
        openai_api_key: None,
        chat_model: "gpt-4o-mini".to_string(),
        quiz_model: "gpt-4o-mini".to_string(),
        summary_model: "gpt-4o-mini".to_string(),
        identity_provider_url: String::new(),
        allowed_origins: Vec::new(),
    };
    Arc::new(AppState {
        db,
        config: Arc::new(config),
        identity: Arc::new(NullIdentity),
        tutor: None,
        quiz_generator: None,
        summarizer: None,
    })
}
