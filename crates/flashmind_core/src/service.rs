//! crates/flashmind_core/src/service.rs
//!
//! The resource service: create/read/update for chats, lectures and flashcards.
//!
//! Every chat-scoped call runs the authorization gate before touching the
//! cache. Reads go through the cache and fall back to the store on a miss.
//! Writes commit to the store first and only then invalidate the affected
//! cache keys. Nothing is written through to the cache on mutation.

use crate::authz::AuthorizationGate;
use crate::cache::{CacheKey, Mutation, ScopedCache, DEFAULT_CACHE_TTL};
use crate::domain::{CardPair, FlashcardStatus};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{CacheService, DatabaseService, FlashcardGenerationService, PortError};
use crate::views::{ChatView, FlashcardView, LectureDetailView, LectureView};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Notes shorter than this are rejected before the generator is called.
pub const MIN_NOTES_CHARS: usize = 10;

/// Default external timeout on a single generation call.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables for [`ResourceService`].
#[derive(Debug, Clone, Copy)]
pub struct ServiceSettings {
    pub cache_ttl: Duration,
    pub generation_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }
}

pub struct ResourceService {
    db: Arc<dyn DatabaseService>,
    cache: ScopedCache,
    gate: AuthorizationGate,
    generator: Arc<dyn FlashcardGenerationService>,
    generation_timeout: Duration,
}

impl ResourceService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        cache: Arc<dyn CacheService>,
        generator: Arc<dyn FlashcardGenerationService>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            gate: AuthorizationGate::new(db.clone()),
            cache: ScopedCache::new(cache, settings.cache_ttl),
            db,
            generator,
            generation_timeout: settings.generation_timeout,
        }
    }

    //=====================================================================================
    // Chats
    //=====================================================================================

    pub async fn create_chat(&self, caller_id: Uuid, name: &str) -> ServiceResult<ChatView> {
        let name = required_name(name, "Chat name")?;
        let chat = self.db.create_chat(caller_id, name).await?;
        self.cache
            .invalidate(&Mutation::ChatCreated { owner_id: caller_id })
            .await;
        info!(chat_id = %chat.id, %caller_id, "Chat created");
        Ok(chat.into())
    }

    pub async fn list_chats(&self, caller_id: Uuid) -> ServiceResult<Vec<ChatView>> {
        self.cache
            .read_through(CacheKey::Chats { user_id: caller_id }, || {
                self.load_chats(caller_id)
            })
            .await
    }

    //=====================================================================================
    // Lectures
    //=====================================================================================

    pub async fn create_lecture(
        &self,
        caller_id: Uuid,
        chat_id: Uuid,
        name: &str,
    ) -> ServiceResult<LectureView> {
        self.gate.authorize_chat_access(caller_id, chat_id).await?;
        let name = required_name(name, "Lecture name")?;

        let lecture = self.db.create_lecture(chat_id, name).await?;
        self.cache
            .invalidate(&Mutation::LectureCreated { chat_id })
            .await;
        info!(lecture_id = %lecture.id, %chat_id, "Lecture created");
        Ok(lecture.into())
    }

    pub async fn list_lectures(
        &self,
        caller_id: Uuid,
        chat_id: Uuid,
    ) -> ServiceResult<Vec<LectureView>> {
        self.gate.authorize_chat_access(caller_id, chat_id).await?;
        self.cache
            .read_through(CacheKey::Lectures { chat_id }, || {
                self.load_lectures(chat_id)
            })
            .await
    }

    pub async fn get_lecture(
        &self,
        caller_id: Uuid,
        chat_id: Uuid,
        lecture_id: Uuid,
    ) -> ServiceResult<LectureDetailView> {
        self.gate.authorize_chat_access(caller_id, chat_id).await?;
        self.cache
            .read_through(
                CacheKey::Lecture {
                    chat_id,
                    lecture_id,
                },
                || self.load_lecture_detail(chat_id, lecture_id),
            )
            .await
    }

    pub async fn update_lecture_notes(
        &self,
        caller_id: Uuid,
        chat_id: Uuid,
        lecture_id: Uuid,
        notes: &str,
    ) -> ServiceResult<LectureView> {
        self.gate.authorize_chat_access(caller_id, chat_id).await?;

        let lecture = self
            .db
            .update_lecture_notes(chat_id, lecture_id, notes)
            .await?;
        self.cache
            .invalidate(&Mutation::LectureNotesUpdated {
                chat_id,
                lecture_id,
            })
            .await;
        info!(%lecture_id, %chat_id, "Lecture notes updated");
        Ok(lecture.into())
    }

    //=====================================================================================
    // Flashcards
    //=====================================================================================

    pub async fn list_flashcards(
        &self,
        caller_id: Uuid,
        chat_id: Uuid,
        lecture_id: Uuid,
    ) -> ServiceResult<Vec<FlashcardView>> {
        self.gate.authorize_chat_access(caller_id, chat_id).await?;
        self.cache
            .read_through(
                CacheKey::Flashcards {
                    chat_id,
                    lecture_id,
                },
                || self.load_flashcards(chat_id, lecture_id),
            )
            .await
    }

    /// Appends a batch of new, unclassified flashcards to a lecture.
    pub async fn create_flashcards(
        &self,
        caller_id: Uuid,
        chat_id: Uuid,
        lecture_id: Uuid,
        pairs: &[CardPair],
    ) -> ServiceResult<Vec<FlashcardView>> {
        self.gate.authorize_chat_access(caller_id, chat_id).await?;
        self.insert_flashcards(chat_id, lecture_id, pairs).await
    }

    pub async fn update_flashcard_status(
        &self,
        caller_id: Uuid,
        chat_id: Uuid,
        lecture_id: Uuid,
        flashcard_id: Uuid,
        is_known: bool,
        is_review: bool,
    ) -> ServiceResult<FlashcardView> {
        self.gate.authorize_chat_access(caller_id, chat_id).await?;
        let status = FlashcardStatus::from_flags(is_known, is_review).ok_or_else(|| {
            ServiceError::Validation("A flashcard cannot be both known and under review".into())
        })?;

        let card = self
            .db
            .update_flashcard_status(chat_id, lecture_id, flashcard_id, status)
            .await?;
        self.cache
            .invalidate(&Mutation::FlashcardUpdated {
                chat_id,
                lecture_id,
            })
            .await;
        info!(%flashcard_id, %lecture_id, ?status, "Flashcard status updated");
        Ok(card.into())
    }

    //=====================================================================================
    // Generation
    //=====================================================================================

    /// Generates front/back pairs from raw notes without persisting anything.
    pub async fn generate_cards(&self, notes: &str) -> ServiceResult<Vec<CardPair>> {
        if notes.chars().count() < MIN_NOTES_CHARS {
            return Err(ServiceError::Validation(format!(
                "Lecture notes must be at least {} characters",
                MIN_NOTES_CHARS
            )));
        }

        let outcome =
            tokio::time::timeout(self.generation_timeout, self.generator.generate_flashcards(notes))
                .await;

        match outcome {
            Ok(Ok(cards)) => {
                if cards.iter().any(CardPair::is_blank) {
                    warn!("Generator returned a card with a blank side");
                    return Err(ServiceError::UpstreamMalformed(
                        "Generator returned a card with a blank side".into(),
                    ));
                }
                Ok(cards)
            }
            Ok(Err(PortError::Malformed(msg))) => {
                error!("Generator returned malformed output: {}", msg);
                Err(ServiceError::UpstreamMalformed(msg))
            }
            Ok(Err(e)) => {
                error!("Generator call failed: {:?}", e);
                Err(ServiceError::UpstreamGeneration(e.to_string()))
            }
            Err(_) => {
                error!(timeout = ?self.generation_timeout, "Generator call timed out");
                Err(ServiceError::UpstreamGeneration("Generation timed out".into()))
            }
        }
    }

    /// Generates flashcards from a lecture's stored notes and appends them to it.
    /// An empty generation saves nothing and leaves the cache alone.
    pub async fn generate_lecture_flashcards(
        &self,
        caller_id: Uuid,
        chat_id: Uuid,
        lecture_id: Uuid,
    ) -> ServiceResult<Vec<FlashcardView>> {
        self.gate.authorize_chat_access(caller_id, chat_id).await?;
        let lecture = self.db.get_lecture(chat_id, lecture_id).await?;
        let pairs = self.generate_cards(&lecture.notes).await?;
        if pairs.is_empty() {
            info!(%lecture_id, "Generator produced no cards; nothing to save");
            return Ok(Vec::new());
        }
        self.insert_flashcards(chat_id, lecture_id, &pairs).await
    }

    //=====================================================================================
    // Store loaders (cache-miss paths)
    //=====================================================================================

    async fn load_chats(&self, caller_id: Uuid) -> ServiceResult<Vec<ChatView>> {
        let chats = self.db.list_chats(caller_id).await?;
        Ok(chats.into_iter().map(ChatView::from).collect())
    }

    async fn load_lectures(&self, chat_id: Uuid) -> ServiceResult<Vec<LectureView>> {
        let lectures = self.db.list_lectures(chat_id).await?;
        Ok(lectures.into_iter().map(LectureView::from).collect())
    }

    async fn load_lecture_detail(
        &self,
        chat_id: Uuid,
        lecture_id: Uuid,
    ) -> ServiceResult<LectureDetailView> {
        let lecture = self.db.get_lecture(chat_id, lecture_id).await?;
        let flashcards = self.db.list_flashcards(lecture_id).await?;
        Ok(LectureDetailView::compose(lecture, flashcards))
    }

    async fn load_flashcards(
        &self,
        chat_id: Uuid,
        lecture_id: Uuid,
    ) -> ServiceResult<Vec<FlashcardView>> {
        // Resolve the lecture under this chat before listing its cards.
        self.db.get_lecture(chat_id, lecture_id).await?;
        let cards = self.db.list_flashcards(lecture_id).await?;
        Ok(cards.into_iter().map(FlashcardView::from).collect())
    }

    async fn insert_flashcards(
        &self,
        chat_id: Uuid,
        lecture_id: Uuid,
        pairs: &[CardPair],
    ) -> ServiceResult<Vec<FlashcardView>> {
        if pairs.is_empty() {
            return Err(ServiceError::Validation(
                "At least one flashcard is required".into(),
            ));
        }
        if pairs.iter().any(CardPair::is_blank) {
            return Err(ServiceError::Validation(
                "Flashcards need both a front and a back".into(),
            ));
        }

        let cards = self
            .db
            .create_flashcards(chat_id, lecture_id, pairs)
            .await?;
        self.cache
            .invalidate(&Mutation::FlashcardsCreated {
                chat_id,
                lecture_id,
            })
            .await;
        info!(%lecture_id, count = cards.len(), "Flashcards created");
        Ok(cards.into_iter().map(FlashcardView::from).collect())
    }
}

fn required_name<'a>(name: &'a str, what: &str) -> ServiceResult<&'a str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{} must not be empty", what)));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed() {
        assert_eq!(required_name("  Biology ", "Chat name").unwrap(), "Biology");
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(matches!(
            required_name("   ", "Chat name"),
            Err(ServiceError::Validation(_))
        ));
    }
}
