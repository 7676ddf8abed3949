//! crates/flashmind_core/src/ports.rs
//!
//! The outbound contracts of the core: persistence, caching and card generation.
//! Adapters in the `api` crate implement them; the core only sees these traits.

use crate::domain::{CardPair, Chat, Flashcard, FlashcardStatus, Lecture, User, UserCredentials};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

//=========================================================================================
// Port Errors
//=========================================================================================

/// Failure of an adapter call, stripped of backend-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Malformed upstream response: {0}")]
    Malformed(String),
    #[error("Unexpected adapter failure: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The source of truth for users, chats, lectures and flashcards.
///
/// Methods that take a parent id (`chat_id`, `lecture_id`) must scope their
/// lookups to that parent and return `PortError::NotFound` when the child
/// exists under a different parent.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User & Auth Methods ---
    async fn create_user(&self, username: &str, password_hash: &str) -> PortResult<User>;

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves a live (unexpired) session to its user id.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Chats ---
    async fn create_chat(&self, owner_id: Uuid, name: &str) -> PortResult<Chat>;

    async fn get_chat(&self, chat_id: Uuid) -> PortResult<Chat>;

    async fn list_chats(&self, owner_id: Uuid) -> PortResult<Vec<Chat>>;

    // --- Lectures ---
    async fn create_lecture(&self, chat_id: Uuid, name: &str) -> PortResult<Lecture>;

    async fn list_lectures(&self, chat_id: Uuid) -> PortResult<Vec<Lecture>>;

    async fn get_lecture(&self, chat_id: Uuid, lecture_id: Uuid) -> PortResult<Lecture>;

    async fn update_lecture_notes(
        &self,
        chat_id: Uuid,
        lecture_id: Uuid,
        notes: &str,
    ) -> PortResult<Lecture>;

    // --- Flashcards ---
    async fn list_flashcards(&self, lecture_id: Uuid) -> PortResult<Vec<Flashcard>>;

    /// Inserts the whole batch or nothing. New cards start `Unclassified`.
    async fn create_flashcards(
        &self,
        chat_id: Uuid,
        lecture_id: Uuid,
        pairs: &[CardPair],
    ) -> PortResult<Vec<Flashcard>>;

    async fn update_flashcard_status(
        &self,
        chat_id: Uuid,
        lecture_id: Uuid,
        flashcard_id: Uuid,
        status: FlashcardStatus,
    ) -> PortResult<Flashcard>;
}

/// A string key-value store with per-entry expiration.
#[async_trait]
pub trait CacheService: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    /// Overwrites any existing value unconditionally.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> PortResult<()>;

    /// Deleting an absent key is a no-op, never an error.
    async fn delete(&self, key: &str) -> PortResult<()>;
}

#[async_trait]
pub trait FlashcardGenerationService: Send + Sync {
    /// Turns raw lecture notes into front/back pairs.
    /// Output that cannot be read as a list of pairs is `PortError::Malformed`.
    async fn generate_flashcards(&self, notes: &str) -> PortResult<Vec<CardPair>>;
}
