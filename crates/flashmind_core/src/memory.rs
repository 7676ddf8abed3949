//! crates/flashmind_core/src/memory.rs
//!
//! An in-process `DatabaseService`. Used when no database URL is configured
//! and as the store behind service-level tests.

use crate::domain::{
    AuthSession, CardPair, Chat, Flashcard, FlashcardStatus, Lecture, User, UserCredentials,
};
use crate::ports::{DatabaseService, PortError, PortResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    sessions: Vec<AuthSession>,
    chats: Vec<Chat>,
    lectures: Vec<Lecture>,
    flashcards: Vec<Flashcard>,
}

impl Tables {
    fn lecture_in_chat(&self, chat_id: Uuid, lecture_id: Uuid) -> PortResult<&Lecture> {
        self.lectures
            .iter()
            .find(|l| l.id == lecture_id && l.chat_id == chat_id)
            .ok_or_else(|| {
                PortError::NotFound(format!("Lecture {} not found in chat {}", lecture_id, chat_id))
            })
    }
}

/// Vec-backed tables behind a single lock. Rows keep insertion order.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    simulate_write_error: AtomicBool,
    simulate_read_error: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every mutating call fail with `PortError::Unexpected`.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Makes lecture and flashcard reads fail with `PortError::Unexpected`.
    /// Users, sessions and chats stay readable, so ownership checks still pass.
    pub fn set_simulate_read_error(&self, simulate: bool) {
        self.simulate_read_error.store(simulate, Ordering::SeqCst);
    }

    /// Number of live and expired sessions currently held.
    pub fn session_count(&self) -> usize {
        self.tables.read().sessions.len()
    }

    /// Number of port calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_read(&self) -> PortResult<()> {
        self.record_call();
        if self.simulate_read_error.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("Simulated read error".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> PortResult<()> {
        self.record_call();
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("Simulated write error".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DatabaseService for MemoryStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> PortResult<User> {
        self.check_write()?;
        let mut tables = self.tables.write();
        if tables.users.iter().any(|u| u.username == username) {
            return Err(PortError::Conflict(format!("Username {} is taken", username)));
        }
        let creds = UserCredentials {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        let user = User {
            id: creds.id,
            username: creds.username.clone(),
        };
        tables.users.push(creds);
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        self.record_call();
        self.tables
            .read()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", username)))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.check_write()?;
        let now = Utc::now();
        let mut tables = self.tables.write();
        tables.sessions.retain(|s| s.expires_at > now);
        tables.sessions.push(AuthSession {
            id: session_id.to_string(),
            user_id,
            expires_at,
        });
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        self.record_call();
        let now = Utc::now();
        self.tables
            .read()
            .sessions
            .iter()
            .find(|s| s.id == session_id && s.expires_at > now)
            .map(|s| s.user_id)
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.check_write()?;
        self.tables.write().sessions.retain(|s| s.id != session_id);
        Ok(())
    }

    async fn create_chat(&self, owner_id: Uuid, name: &str) -> PortResult<Chat> {
        self.check_write()?;
        let chat = Chat {
            id: Uuid::new_v4(),
            name: name.to_string(),
            owner_id,
        };
        self.tables.write().chats.push(chat.clone());
        Ok(chat)
    }

    async fn get_chat(&self, chat_id: Uuid) -> PortResult<Chat> {
        self.record_call();
        self.tables
            .read()
            .chats
            .iter()
            .find(|c| c.id == chat_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Chat {} not found", chat_id)))
    }

    async fn list_chats(&self, owner_id: Uuid) -> PortResult<Vec<Chat>> {
        self.record_call();
        Ok(self
            .tables
            .read()
            .chats
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create_lecture(&self, chat_id: Uuid, name: &str) -> PortResult<Lecture> {
        self.check_write()?;
        let mut tables = self.tables.write();
        if !tables.chats.iter().any(|c| c.id == chat_id) {
            return Err(PortError::NotFound(format!("Chat {} not found", chat_id)));
        }
        let lecture = Lecture {
            id: Uuid::new_v4(),
            chat_id,
            name: name.to_string(),
            notes: String::new(),
        };
        tables.lectures.push(lecture.clone());
        Ok(lecture)
    }

    async fn list_lectures(&self, chat_id: Uuid) -> PortResult<Vec<Lecture>> {
        self.check_read()?;
        Ok(self
            .tables
            .read()
            .lectures
            .iter()
            .filter(|l| l.chat_id == chat_id)
            .cloned()
            .collect())
    }

    async fn get_lecture(&self, chat_id: Uuid, lecture_id: Uuid) -> PortResult<Lecture> {
        self.check_read()?;
        self.tables
            .read()
            .lecture_in_chat(chat_id, lecture_id)
            .cloned()
    }

    async fn update_lecture_notes(
        &self,
        chat_id: Uuid,
        lecture_id: Uuid,
        notes: &str,
    ) -> PortResult<Lecture> {
        self.check_write()?;
        let mut tables = self.tables.write();
        let lecture = tables
            .lectures
            .iter_mut()
            .find(|l| l.id == lecture_id && l.chat_id == chat_id)
            .ok_or_else(|| {
                PortError::NotFound(format!("Lecture {} not found in chat {}", lecture_id, chat_id))
            })?;
        lecture.notes = notes.to_string();
        Ok(lecture.clone())
    }

    async fn list_flashcards(&self, lecture_id: Uuid) -> PortResult<Vec<Flashcard>> {
        self.check_read()?;
        Ok(self
            .tables
            .read()
            .flashcards
            .iter()
            .filter(|f| f.lecture_id == lecture_id)
            .cloned()
            .collect())
    }

    async fn create_flashcards(
        &self,
        chat_id: Uuid,
        lecture_id: Uuid,
        pairs: &[CardPair],
    ) -> PortResult<Vec<Flashcard>> {
        self.check_write()?;
        let mut tables = self.tables.write();
        tables.lecture_in_chat(chat_id, lecture_id)?;
        let cards: Vec<Flashcard> = pairs
            .iter()
            .map(|pair| Flashcard {
                id: Uuid::new_v4(),
                lecture_id,
                front: pair.front.clone(),
                back: pair.back.clone(),
                status: FlashcardStatus::Unclassified,
            })
            .collect();
        tables.flashcards.extend(cards.iter().cloned());
        Ok(cards)
    }

    async fn update_flashcard_status(
        &self,
        chat_id: Uuid,
        lecture_id: Uuid,
        flashcard_id: Uuid,
        status: FlashcardStatus,
    ) -> PortResult<Flashcard> {
        self.check_write()?;
        let mut tables = self.tables.write();
        tables.lecture_in_chat(chat_id, lecture_id)?;
        let card = tables
            .flashcards
            .iter_mut()
            .find(|f| f.id == flashcard_id && f.lecture_id == lecture_id)
            .ok_or_else(|| {
                PortError::NotFound(format!(
                    "Flashcard {} not found in lecture {}",
                    flashcard_id, lecture_id
                ))
            })?;
        card.status = status;
        Ok(card.clone())
    }
}
