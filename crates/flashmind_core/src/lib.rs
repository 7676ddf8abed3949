pub mod authz;
pub mod cache;
pub mod domain;
pub mod error;
pub mod memory;
pub mod ports;
pub mod service;
pub mod views;

pub use authz::AuthorizationGate;
pub use cache::{CacheKey, Mutation, ScopedCache, DEFAULT_CACHE_TTL};
pub use domain::{
    AuthSession, CardPair, Chat, Flashcard, FlashcardStatus, Lecture, User, UserCredentials,
};
pub use error::{ServiceError, ServiceResult};
pub use memory::MemoryStore;
pub use ports::{
    CacheService, DatabaseService, FlashcardGenerationService, PortError, PortResult,
};
pub use service::{ResourceService, ServiceSettings, MIN_NOTES_CHARS};
pub use views::{CardView, ChatView, FlashcardView, LectureDetailView, LectureView};
