//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the tutoring chat LLM.
//! It implements the `TutorChatService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    error::OpenAIError,
    Client,
};
use async_trait::async_trait;
use tutor_core::domain::{ChatMessage, MessageRole};
use tutor_core::ports::{PortError, PortResult, TutorChatService};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TutorChatService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiTutorAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiTutorAdapter {
    /// Creates a new `OpenAiTutorAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

fn system_instruction(topic: &str) -> String {
    format!(
        "You are an expert AI tutor helping users learn about {topic}. \
         Provide clear, engaging explanations with examples. \
         Keep responses concise but informative."
    )
}

//=========================================================================================
// `TutorChatService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TutorChatService for OpenAiTutorAdapter {
    /// Produces the assistant's reply for one chat turn by replaying the full
    /// conversation, role-preserving, behind a topic-parameterized system
    /// instruction.
    async fn reply(&self, topic: &str, history: &[ChatMessage]) -> PortResult<String> {
        let mut messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(history.len() + 1);

        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_instruction(topic))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );

        for msg in history {
            let request_message = match msg.role {
                MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(msg.content.clone())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
                MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(msg.content.clone())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            };
            messages.push(request_message);
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(PortError::Unexpected(
                    "Tutor LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Tutor LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}
