//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use tutor_core::ports::{
    DatabaseService, IdentityService, QuizGenerationService, SummarizationService,
    TutorChatService,
};

/// The shared application state, created once at startup and passed to all handlers.
///
/// The LLM-backed adapters are optional: when no credential is configured the
/// endpoints that need them answer 503 instead of the process failing to start.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub identity: Arc<dyn IdentityService>,
    pub tutor: Option<Arc<dyn TutorChatService>>,
    pub quiz_generator: Option<Arc<dyn QuizGenerationService>>,
    pub summarizer: Option<Arc<dyn SummarizationService>>,
}
