pub mod chat_llm;
pub mod db;
pub mod identity;
pub mod quiz_llm;
pub mod summary_llm;

pub use chat_llm::OpenAiTutorAdapter;
pub use db::DbAdapter;
pub use identity::HttpIdentityAdapter;
pub use quiz_llm::OpenAiQuizAdapter;
pub use summary_llm::OpenAiSummaryAdapter;
