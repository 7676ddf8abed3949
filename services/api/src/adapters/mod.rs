pub mod cache;
pub mod canned;
pub mod db;
pub mod flashcards_llm;

pub use cache::{MokaCacheAdapter, RedisCacheAdapter};
pub use canned::{canned_cards, CannedFlashcardsAdapter};
pub use db::DbAdapter;
pub use flashcards_llm::OpenAiFlashcardsAdapter;
