//! services/api/src/adapters/quiz_llm.rs
//!
//! This module contains the adapter for the quiz-generating LLM.
//! It implements the `QuizGenerationService` port from the `core` crate.
//!
//! The model is asked for bare JSON but routinely wraps it in a markdown
//! code fence anyway, so the response is unwrapped through a single
//! extraction function before parsing.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    error::OpenAIError,
    Client,
};
use async_trait::async_trait;
use tutor_core::domain::QuizQuestion;
use tutor_core::ports::{PortError, PortResult, QuizGenerationService};

fn quiz_instruction(topic: &str, num_questions: u32) -> String {
    format!(
        r#"You are an expert quiz generator. Generate {num_questions} multiple-choice questions about {topic}.

Return ONLY a valid JSON array of objects with this exact structure:
[
  {{
    "question": "Question text here?",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correct_answer": "Option A",
    "explanation": "Brief explanation why this is correct"
  }}
]

Make sure questions are educational, clear, and have distinct options."#
    )
}

/// Extracts the structured payload from free-form model output.
///
/// Prefers the body of a ```json fence, falls back to a bare ``` fence, and
/// otherwise treats the whole text as the payload. Parsing is left to the
/// caller so the failure carries the parser's own message.
pub fn extract_json_payload(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(start) = trimmed.find("```json") {
        let body = &trimmed[start + "```json".len()..];
        return body.split("```").next().unwrap_or(body).trim();
    }
    if let Some(start) = trimmed.find("```") {
        let body = &trimmed[start + "```".len()..];
        return body.split("```").next().unwrap_or(body).trim();
    }
    trimmed
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `QuizGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiQuizAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiQuizAdapter {
    /// Creates a new `OpenAiQuizAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `QuizGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl QuizGenerationService for OpenAiQuizAdapter {
    /// Generates multiple-choice questions on a topic and parses them out of
    /// the model's reply. No repair attempt is made on a malformed reply; the
    /// raw parser message propagates to the caller.
    async fn generate_questions(
        &self,
        topic: &str,
        num_questions: u32,
    ) -> PortResult<Vec<QuizQuestion>> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(quiz_instruction(topic, num_questions))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!(
                    "Generate {num_questions} quiz questions about {topic}"
                ))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Quiz LLM response contained no text content.".to_string())
            })?;

        let payload = extract_json_payload(&content);
        let questions: Vec<QuizQuestion> = serde_json::from_str(payload)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW_ARRAY: &str = r#"[{"question": "Q?", "options": ["a", "b", "c", "d"], "correct_answer": "a", "explanation": "because"}]"#;

    #[test]
    fn passes_bare_json_through() {
        assert_eq!(extract_json_payload(RAW_ARRAY), RAW_ARRAY);
    }

    #[test]
    fn strips_json_fence() {
        let wrapped = format!("```json\n{RAW_ARRAY}\n```");
        assert_eq!(extract_json_payload(&wrapped), RAW_ARRAY);
    }

    #[test]
    fn strips_anonymous_fence() {
        let wrapped = format!("```\n{RAW_ARRAY}\n```");
        assert_eq!(extract_json_payload(&wrapped), RAW_ARRAY);
    }

    #[test]
    fn ignores_prose_around_a_fence() {
        let wrapped = format!("Here you go:\n```json\n{RAW_ARRAY}\n```\nEnjoy!");
        assert_eq!(extract_json_payload(&wrapped), RAW_ARRAY);
    }

    #[test]
    fn extracted_payload_parses_into_questions() {
        let wrapped = format!("```json\n{RAW_ARRAY}\n```");
        let questions: Vec<QuizQuestion> =
            serde_json::from_str(extract_json_payload(&wrapped)).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options.len(), 4);
        assert_eq!(questions[0].correct_answer, "a");
    }

    #[test]
    fn garbage_payload_fails_to_parse() {
        let payload = extract_json_payload("I couldn't come up with any questions, sorry.");
        assert!(serde_json::from_str::<Vec<QuizQuestion>>(payload).is_err());
    }
}
