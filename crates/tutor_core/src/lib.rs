pub mod domain;
pub mod ports;

pub use domain::{
    ChatHistory, ChatMessage, IdentityProfile, MessageRole, Progress, QuizQuestion, QuizResult,
    Session, User, XpAward,
};
pub use ports::{
    DatabaseService, IdentityService, PortError, PortResult, QuizGenerationService,
    SummarizationService, TutorChatService,
};
