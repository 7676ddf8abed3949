//! services/api/src/adapters/flashcards_llm.rs
//!
//! This module contains the adapter for the flashcard-generating LLM.
//! It implements the `FlashcardGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use flashmind_core::{
    domain::CardPair,
    ports::{FlashcardGenerationService, PortError, PortResult},
};
use serde::Deserialize;
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are a study assistant that writes flashcards. \
Read the lecture notes and produce concise question/answer flashcards covering the key facts. \
Respond with a single JSON object and nothing else, in exactly this shape: \
{\"cards\":[{\"front\":\"question\",\"back\":\"answer\"}]}";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `FlashcardGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiFlashcardsAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiFlashcardsAdapter {
    /// Creates a new `OpenAiFlashcardsAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[derive(Deserialize)]
struct GeneratedDeck {
    cards: Option<Vec<GeneratedCard>>,
}

#[derive(Deserialize)]
struct GeneratedCard {
    front: String,
    back: String,
}

/// Parses the model's reply into card pairs. Models sometimes wrap JSON in a
/// markdown fence, so that is stripped first.
fn parse_cards(content: &str) -> PortResult<Vec<CardPair>> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let deck: GeneratedDeck = serde_json::from_str(body)
        .map_err(|e| PortError::Malformed(format!("Generator reply is not valid JSON: {}", e)))?;
    let cards = deck
        .cards
        .ok_or_else(|| PortError::Malformed("Generator reply has no `cards` array".to_string()))?;
    Ok(cards
        .into_iter()
        .map(|card| CardPair::new(card.front, card.back))
        .collect())
}

//=========================================================================================
// `FlashcardGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl FlashcardGenerationService for OpenAiFlashcardsAdapter {
    async fn generate_flashcards(&self, notes: &str) -> PortResult<Vec<CardPair>> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!("LECTURE NOTES:\n{}", notes))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.5)
            .n(1)
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
                PortError::Malformed("Flashcard LLM response contained no text content.".to_string())
            })?;

        debug!(chars = content.len(), "Received flashcard generation reply.");
        parse_cards(&content)
    }
}
