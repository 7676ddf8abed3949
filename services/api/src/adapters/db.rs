//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flashmind_core::domain::{
    CardPair, Chat, Flashcard, FlashcardStatus, Lecture, User, UserCredentials,
};
use flashmind_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Closes the pool, waiting for in-flight connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    password_hash: String,
}
impl UserRecord {
    fn to_credentials(self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct ChatRecord {
    id: Uuid,
    owner_id: Uuid,
    name: String,
}
impl ChatRecord {
    fn to_domain(self) -> Chat {
        Chat {
            id: self.id,
            name: self.name,
            owner_id: self.owner_id,
        }
    }
}

#[derive(FromRow)]
struct LectureRecord {
    id: Uuid,
    chat_id: Uuid,
    name: String,
    notes: String,
}
impl LectureRecord {
    fn to_domain(self) -> Lecture {
        Lecture {
            id: self.id,
            chat_id: self.chat_id,
            name: self.name,
            notes: self.notes,
        }
    }
}

#[derive(FromRow)]
struct FlashcardRecord {
    id: Uuid,
    lecture_id: Uuid,
    front: String,
    back: String,
    is_known: bool,
    is_review: bool,
}
impl FlashcardRecord {
    fn to_domain(self) -> PortResult<Flashcard> {
        let status = FlashcardStatus::from_flags(self.is_known, self.is_review).ok_or_else(|| {
            PortError::Unexpected(format!("Flashcard {} has both status flags set", self.id))
        })?;
        Ok(Flashcard {
            id: self.id,
            lecture_id: self.lecture_id,
            front: self.front,
            back: self.back,
            status,
        })
    }
}

const FLASHCARD_COLUMNS: &str = "id, lecture_id, front, back, is_known, is_review";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, username: &str, password_hash: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3) \
             RETURNING id, username, password_hash",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                PortError::Conflict(format!("Username {} is taken", username))
            }
            _ => unexpected(e),
        })?;

        Ok(User {
            id: record.id,
            username: record.username,
        })
    }

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", username)),
            _ => unexpected(e),
        })?;
        Ok(record.to_credentials())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_chat(&self, owner_id: Uuid, name: &str) -> PortResult<Chat> {
        let record = sqlx::query_as::<_, ChatRecord>(
            "INSERT INTO chats (id, owner_id, name) VALUES ($1, $2, $3) RETURNING id, owner_id, name",
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_chat(&self, chat_id: Uuid) -> PortResult<Chat> {
        let record = sqlx::query_as::<_, ChatRecord>(
            "SELECT id, owner_id, name FROM chats WHERE id = $1",
        )
        .bind(chat_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Chat {} not found", chat_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_chats(&self, owner_id: Uuid) -> PortResult<Vec<Chat>> {
        let records = sqlx::query_as::<_, ChatRecord>(
            "SELECT id, owner_id, name FROM chats WHERE owner_id = $1 ORDER BY seq ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_lecture(&self, chat_id: Uuid, name: &str) -> PortResult<Lecture> {
        let record = sqlx::query_as::<_, LectureRecord>(
            "INSERT INTO lectures (id, chat_id, name, notes) VALUES ($1, $2, $3, '') \
             RETURNING id, chat_id, name, notes",
        )
        .bind(Uuid::new_v4())
        .bind(chat_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                PortError::NotFound(format!("Chat {} not found", chat_id))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_lectures(&self, chat_id: Uuid) -> PortResult<Vec<Lecture>> {
        let records = sqlx::query_as::<_, LectureRecord>(
            "SELECT id, chat_id, name, notes FROM lectures WHERE chat_id = $1 ORDER BY seq ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_lecture(&self, chat_id: Uuid, lecture_id: Uuid) -> PortResult<Lecture> {
        let record = sqlx::query_as::<_, LectureRecord>(
            "SELECT id, chat_id, name, notes FROM lectures WHERE id = $1 AND chat_id = $2",
        )
        .bind(lecture_id)
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| {
            PortError::NotFound(format!("Lecture {} not found in chat {}", lecture_id, chat_id))
        })?;
        Ok(record.to_domain())
    }

    async fn update_lecture_notes(
        &self,
        chat_id: Uuid,
        lecture_id: Uuid,
        notes: &str,
    ) -> PortResult<Lecture> {
        let record = sqlx::query_as::<_, LectureRecord>(
            "UPDATE lectures SET notes = $1 WHERE id = $2 AND chat_id = $3 \
             RETURNING id, chat_id, name, notes",
        )
        .bind(notes)
        .bind(lecture_id)
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| {
            PortError::NotFound(format!("Lecture {} not found in chat {}", lecture_id, chat_id))
        })?;
        Ok(record.to_domain())
    }

    async fn list_flashcards(&self, lecture_id: Uuid) -> PortResult<Vec<Flashcard>> {
        let records = sqlx::query_as::<_, FlashcardRecord>(&format!(
            "SELECT {} FROM flashcards WHERE lecture_id = $1 ORDER BY seq ASC",
            FLASHCARD_COLUMNS
        ))
        .bind(lecture_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn create_flashcards(
        &self,
        chat_id: Uuid,
        lecture_id: Uuid,
        pairs: &[CardPair],
    ) -> PortResult<Vec<Flashcard>> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let parent = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM lectures WHERE id = $1 AND chat_id = $2 FOR SHARE",
        )
        .bind(lecture_id)
        .bind(chat_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?;
        if parent.is_none() {
            return Err(PortError::NotFound(format!(
                "Lecture {} not found in chat {}",
                lecture_id, chat_id
            )));
        }

        let insert = format!(
            "INSERT INTO flashcards (id, lecture_id, front, back) VALUES ($1, $2, $3, $4) RETURNING {}",
            FLASHCARD_COLUMNS
        );
        let mut cards = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let record = sqlx::query_as::<_, FlashcardRecord>(&insert)
                .bind(Uuid::new_v4())
                .bind(lecture_id)
                .bind(&pair.front)
                .bind(&pair.back)
                .fetch_one(&mut *tx)
                .await
                .map_err(unexpected)?;
            cards.push(record.to_domain()?);
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(cards)
    }

    async fn update_flashcard_status(
        &self,
        chat_id: Uuid,
        lecture_id: Uuid,
        flashcard_id: Uuid,
        status: FlashcardStatus,
    ) -> PortResult<Flashcard> {
        let record = sqlx::query_as::<_, FlashcardRecord>(
            "UPDATE flashcards f SET is_known = $1, is_review = $2 \
             FROM lectures l \
             WHERE f.id = $3 AND f.lecture_id = $4 AND l.id = f.lecture_id AND l.chat_id = $5 \
             RETURNING f.id, f.lecture_id, f.front, f.back, f.is_known, f.is_review",
        )
        .bind(status.is_known())
        .bind(status.is_review())
        .bind(flashcard_id)
        .bind(lecture_id)
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| {
            PortError::NotFound(format!(
                "Flashcard {} not found in lecture {}",
                flashcard_id, lecture_id
            ))
        })?;
        record.to_domain()
    }
}
