//! crates/flashmind_core/src/views.rs
//!
//! Response-shaped payloads. These are what handlers return and what the cache
//! stores, so a cache hit can be handed back without touching the store.

use crate::domain::{CardPair, Chat, Flashcard, Lecture};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    pub id: Uuid,
    pub name: String,
}

impl From<Chat> for ChatView {
    fn from(chat: Chat) -> Self {
        Self {
            id: chat.id,
            name: chat.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LectureView {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub name: String,
    pub notes: String,
}

impl From<Lecture> for LectureView {
    fn from(lecture: Lecture) -> Self {
        Self {
            id: lecture.id,
            chat_id: lecture.chat_id,
            name: lecture.name,
            notes: lecture.notes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardView {
    pub id: Uuid,
    pub lecture_id: Uuid,
    pub front: String,
    pub back: String,
    pub is_known: bool,
    pub is_review: bool,
}

impl From<Flashcard> for FlashcardView {
    fn from(card: Flashcard) -> Self {
        Self {
            id: card.id,
            lecture_id: card.lecture_id,
            is_known: card.status.is_known(),
            is_review: card.status.is_review(),
            front: card.front,
            back: card.back,
        }
    }
}

/// A lecture together with all of its flashcards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LectureDetailView {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub name: String,
    pub notes: String,
    pub flashcards: Vec<FlashcardView>,
}

impl LectureDetailView {
    pub fn compose(lecture: Lecture, flashcards: Vec<Flashcard>) -> Self {
        Self {
            id: lecture.id,
            chat_id: lecture.chat_id,
            name: lecture.name,
            notes: lecture.notes,
            flashcards: flashcards.into_iter().map(FlashcardView::from).collect(),
        }
    }
}

/// A front/back pair as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CardView {
    pub front: String,
    pub back: String,
}

impl From<CardPair> for CardView {
    fn from(pair: CardPair) -> Self {
        Self {
            front: pair.front,
            back: pair.back,
        }
    }
}

impl From<CardView> for CardPair {
    fn from(card: CardView) -> Self {
        CardPair::new(card.front, card.back)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FlashcardStatus;

    #[test]
    fn flashcard_view_uses_camel_case_flags() {
        let card = Flashcard {
            id: Uuid::nil(),
            lecture_id: Uuid::nil(),
            front: "What is mitochondria?".into(),
            back: "Powerhouse of the cell".into(),
            status: FlashcardStatus::Review,
        };
        let json = serde_json::to_value(FlashcardView::from(card)).unwrap();
        assert_eq!(json["isKnown"], false);
        assert_eq!(json["isReview"], true);
        assert_eq!(json["lectureId"], Uuid::nil().to_string());
    }

    #[test]
    fn lecture_detail_keeps_card_order() {
        let lecture = Lecture {
            id: Uuid::new_v4(),
            chat_id: Uuid::new_v4(),
            name: "Cell Structure".into(),
            notes: String::new(),
        };
        let cards: Vec<Flashcard> = ["a", "b", "c"]
            .iter()
            .map(|front| Flashcard {
                id: Uuid::new_v4(),
                lecture_id: lecture.id,
                front: front.to_string(),
                back: "x".into(),
                status: FlashcardStatus::Unclassified,
            })
            .collect();
        let detail = LectureDetailView::compose(lecture, cards);
        let fronts: Vec<_> = detail.flashcards.iter().map(|c| c.front.as_str()).collect();
        assert_eq!(fronts, ["a", "b", "c"]);
    }
}
