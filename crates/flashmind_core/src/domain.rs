//! crates/flashmind_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A named collection of lectures, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
}

/// A lecture inside a chat. `notes` is free text and is edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lecture {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub name: String,
    pub notes: String,
}

/// The study classification of a flashcard.
///
/// The three variants partition a lecture's cards. Storage keeps the legacy
/// `is_known`/`is_review` flag pair, which is always derived from this value,
/// so both flags can never be set at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashcardStatus {
    #[default]
    Unclassified,
    Known,
    Review,
}

impl FlashcardStatus {
    /// Builds a status from the caller-supplied flag pair.
    /// Returns `None` for the invalid `(true, true)` combination.
    pub fn from_flags(is_known: bool, is_review: bool) -> Option<Self> {
        match (is_known, is_review) {
            (false, false) => Some(Self::Unclassified),
            (true, false) => Some(Self::Known),
            (false, true) => Some(Self::Review),
            (true, true) => None,
        }
    }

    pub fn is_known(self) -> bool {
        self == Self::Known
    }

    pub fn is_review(self) -> bool {
        self == Self::Review
    }
}

/// A single question/answer card belonging to one lecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flashcard {
    pub id: Uuid,
    pub lecture_id: Uuid,
    pub front: String,
    pub back: String,
    pub status: FlashcardStatus,
}

/// A front/back pair, either produced by the generator or supplied by a caller
/// before it is persisted as a `Flashcard`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardPair {
    pub front: String,
    pub back: String,
}

impl CardPair {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }

    /// A pair is usable only when both sides carry text.
    pub fn is_blank(&self) -> bool {
        self.front.trim().is_empty() || self.back.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_flags_round_trip_for_every_valid_pair() {
        for status in [
            FlashcardStatus::Unclassified,
            FlashcardStatus::Known,
            FlashcardStatus::Review,
        ] {
            let rebuilt = FlashcardStatus::from_flags(status.is_known(), status.is_review());
            assert_eq!(rebuilt, Some(status));
        }
    }

    #[test]
    fn status_rejects_both_flags() {
        assert_eq!(FlashcardStatus::from_flags(true, true), None);
    }

    #[test]
    fn status_never_reports_both_flags() {
        for status in [
            FlashcardStatus::Unclassified,
            FlashcardStatus::Known,
            FlashcardStatus::Review,
        ] {
            assert!(!(status.is_known() && status.is_review()));
        }
    }

    #[test]
    fn blank_pairs_are_detected() {
        assert!(CardPair::new("  ", "answer").is_blank());
        assert!(CardPair::new("question", "").is_blank());
        assert!(!CardPair::new("question", "answer").is_blank());
    }
}
