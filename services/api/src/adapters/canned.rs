//! services/api/src/adapters/canned.rs
//!
//! A generator that returns a fixed deck. Used for `/generate/dummy` and as the
//! fallback when no OpenAI key is configured.

use async_trait::async_trait;
use flashmind_core::{
    domain::CardPair,
    ports::{FlashcardGenerationService, PortResult},
};

/// The fixed sample deck.
pub fn canned_cards() -> Vec<CardPair> {
    vec![
        CardPair::new("When did World War II start?", "1939"),
        CardPair::new("What is the capital of France?", "Paris"),
        CardPair::new(
            "What is the speed of light?",
            "Approximately 299,792,458 meters per second",
        ),
        CardPair::new("Who wrote '1984'?", "George Orwell"),
        CardPair::new("What is the chemical formula for water?", "H₂O"),
    ]
}

#[derive(Clone, Default)]
pub struct CannedFlashcardsAdapter;

#[async_trait]
impl FlashcardGenerationService for CannedFlashcardsAdapter {
    async fn generate_flashcards(&self, _notes: &str) -> PortResult<Vec<CardPair>> {
        Ok(canned_cards())
    }
}
