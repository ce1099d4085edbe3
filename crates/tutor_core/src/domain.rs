//! crates/tutor_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or web framework; the chat
//! message and quiz question types carry serde derives because they are JSON
//! documents end to end (stored as such and exchanged with the LLM).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub learning_interests: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// The profile returned by the external identity provider when an opaque
/// session id is exchanged for a session token.
#[derive(Debug, Clone)]
pub struct IdentityProfile {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub session_token: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct Session {
    pub session_token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// A session past its expiry is inert; the authenticator deletes it on
    /// first use.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// The speaker of one message in a tutoring conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single turn in a chat transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Represents one tutoring conversation on one topic.
///
/// The message sequence is append-only and strictly chronological.
#[derive(Debug, Clone)]
pub struct ChatHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
}

impl ChatHistory {
    pub fn append_user_message(&mut self, content: String, now: DateTime<Utc>) {
        self.messages.push(ChatMessage {
            role: MessageRole::User,
            content,
            timestamp: now,
        });
    }

    pub fn append_assistant_message(&mut self, content: String, now: DateTime<Utc>) {
        self.messages.push(ChatMessage {
            role: MessageRole::Assistant,
            content,
            timestamp: now,
        });
    }
}

/// One multiple-choice question as produced by the quiz generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
}

/// A submitted quiz outcome. Immutable after creation; the question payload
/// is stored verbatim as submitted by the client.
#[derive(Debug, Clone)]
pub struct QuizResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic: String,
    pub score: i32,
    pub total: i32,
    pub questions: Vec<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// A learning action that earns experience points.
#[derive(Debug, Clone)]
pub enum XpAward {
    /// A completed chat turn; the topic joins the learned set.
    ChatTurn { topic: String },
    /// A submitted quiz; `correct` is the raw number of correct answers.
    /// Quiz submissions do not add their topic to the learned set.
    QuizScore { correct: i32 },
    /// A summarization request.
    Summary,
}

impl XpAward {
    pub fn xp(&self) -> i64 {
        match self {
            XpAward::ChatTurn { .. } => 10,
            XpAward::QuizScore { correct } => 20 * i64::from(*correct),
            XpAward::Summary => 5,
        }
    }
}

/// Per-user accumulator of experience points, streak, and topic coverage.
#[derive(Debug, Clone)]
pub struct Progress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub xp_points: i64,
    pub topics_learned: Vec<String>,
    /// Stored but never incremented anywhere; reserved for a future streak
    /// feature.
    pub learning_streak: i32,
    pub last_activity: DateTime<Utc>,
}

impl Progress {
    /// Applies one learning action to the ledger.
    ///
    /// Experience points only ever increase and `topics_learned` only ever
    /// grows (set semantics, insertion order preserved).
    pub fn credit(&mut self, award: &XpAward, now: DateTime<Utc>) {
        self.xp_points += award.xp();
        if let XpAward::ChatTurn { topic } = award {
            if !self.topics_learned.iter().any(|t| t == topic) {
                self.topics_learned.push(topic.clone());
            }
        }
        self.last_activity = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeroed_progress(now: DateTime<Utc>) -> Progress {
        Progress {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            xp_points: 0,
            topics_learned: Vec::new(),
            learning_streak: 0,
            last_activity: now,
        }
    }

    #[test]
    fn chat_turns_dedupe_topics() {
        let now = Utc::now();
        let mut progress = zeroed_progress(now);
        for topic in ["math", "biology", "math"] {
            progress.credit(
                &XpAward::ChatTurn {
                    topic: topic.to_string(),
                },
                now,
            );
        }
        assert_eq!(progress.topics_learned, vec!["math", "biology"]);
        assert_eq!(progress.xp_points, 30);
    }

    #[test]
    fn quiz_award_scales_with_score_and_skips_topics() {
        let now = Utc::now();
        let mut progress = zeroed_progress(now);
        progress.credit(&XpAward::QuizScore { correct: 3 }, now);
        assert_eq!(progress.xp_points, 60);
        assert!(progress.topics_learned.is_empty());
    }

    #[test]
    fn xp_is_monotonically_non_decreasing() {
        let now = Utc::now();
        let mut progress = zeroed_progress(now);
        let awards = [
            XpAward::Summary,
            XpAward::QuizScore { correct: 0 },
            XpAward::ChatTurn {
                topic: "physics".to_string(),
            },
            XpAward::QuizScore { correct: 5 },
            XpAward::Summary,
        ];
        let mut previous = progress.xp_points;
        for award in &awards {
            progress.credit(award, now);
            assert!(progress.xp_points >= previous);
            previous = progress.xp_points;
        }
        assert_eq!(progress.xp_points, 10 + 100 + 10);
    }

    #[test]
    fn credit_updates_last_activity() {
        let start = Utc::now();
        let mut progress = zeroed_progress(start);
        let later = start + chrono::Duration::minutes(5);
        progress.credit(&XpAward::Summary, later);
        assert_eq!(progress.last_activity, later);
        assert_eq!(progress.learning_streak, 0);
    }

    #[test]
    fn fresh_chat_records_user_then_assistant_in_order() {
        let start = Utc::now();
        let mut chat = ChatHistory {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            topic: "python".to_string(),
            messages: Vec::new(),
            created_at: start,
        };
        chat.append_user_message("What is a closure?".to_string(), start);
        let reply_at = start + chrono::Duration::seconds(2);
        chat.append_assistant_message("A closure captures...".to_string(), reply_at);

        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[0].role, MessageRole::User);
        assert_eq!(chat.messages[1].role, MessageRole::Assistant);
        assert!(chat.messages[0].timestamp <= chat.messages[1].timestamp);
    }

    #[test]
    fn session_expiry_is_strict() {
        let now = Utc::now();
        let session = Session {
            session_token: "tok".to_string(),
            user_id: Uuid::new_v4(),
            expires_at: now,
            created_at: now - chrono::Duration::days(7),
        };
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + chrono::Duration::seconds(1)));
    }

    #[test]
    fn message_roles_serialize_lowercase() {
        let msg = ChatMessage {
            role: MessageRole::Assistant,
            content: "hi".to_string(),
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
    }
}
