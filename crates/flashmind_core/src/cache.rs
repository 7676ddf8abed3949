//! crates/flashmind_core/src/cache.rs
//!
//! Read-through / invalidate-on-write caching in front of the store.
//!
//! Every cached view lives under one [`CacheKey`]. Every store mutation is
//! described by a [`Mutation`], and [`Mutation::affected_keys`] is the single
//! table that says which views a mutation makes stale. The [`ScopedCache`]
//! wrapper treats the backend as best effort: a failing backend degrades to
//! cache misses and never fails a request.

use crate::ports::CacheService;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

/// Default lifetime of a cache entry.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

//=========================================================================================
// Key Space
//=========================================================================================

/// One logical cached view.
///
/// Lecture-scoped keys carry the chat id. An entry under `(chat, lecture)` is
/// only ever written after the store confirmed the lecture lives in that chat,
/// and only read after the caller was authorized for that chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `chats:{userId}`
    Chats { user_id: Uuid },
    /// `lectures:{chatId}`
    Lectures { chat_id: Uuid },
    /// `lecture:{chatId}:{lectureId}`, the lecture plus its flashcards.
    Lecture { chat_id: Uuid, lecture_id: Uuid },
    /// `flashcards:{chatId}:{lectureId}`
    Flashcards { chat_id: Uuid, lecture_id: Uuid },
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Chats { user_id } => write!(f, "chats:{}", user_id),
            CacheKey::Lectures { chat_id } => write!(f, "lectures:{}", chat_id),
            CacheKey::Lecture {
                chat_id,
                lecture_id,
            } => write!(f, "lecture:{}:{}", chat_id, lecture_id),
            CacheKey::Flashcards {
                chat_id,
                lecture_id,
            } => write!(f, "flashcards:{}:{}", chat_id, lecture_id),
        }
    }
}

//=========================================================================================
// Invalidation Table
//=========================================================================================

/// A committed store write, described by the scope it touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    ChatCreated { owner_id: Uuid },
    LectureCreated { chat_id: Uuid },
    LectureNotesUpdated { chat_id: Uuid, lecture_id: Uuid },
    FlashcardsCreated { chat_id: Uuid, lecture_id: Uuid },
    FlashcardUpdated { chat_id: Uuid, lecture_id: Uuid },
}

impl Mutation {
    /// Every key whose cached value embeds or derives from the mutated entity.
    pub fn affected_keys(&self) -> Vec<CacheKey> {
        match *self {
            Mutation::ChatCreated { owner_id } => vec![CacheKey::Chats { user_id: owner_id }],
            Mutation::LectureCreated { chat_id } => vec![CacheKey::Lectures { chat_id }],
            Mutation::LectureNotesUpdated {
                chat_id,
                lecture_id,
            } => vec![
                CacheKey::Lectures { chat_id },
                CacheKey::Lecture {
                    chat_id,
                    lecture_id,
                },
            ],
            Mutation::FlashcardsCreated {
                chat_id,
                lecture_id,
            }
            | Mutation::FlashcardUpdated {
                chat_id,
                lecture_id,
            } => vec![
                CacheKey::Flashcards {
                    chat_id,
                    lecture_id,
                },
                CacheKey::Lectures { chat_id },
                CacheKey::Lecture {
                    chat_id,
                    lecture_id,
                },
            ],
        }
    }
}

//=========================================================================================
// Scoped Cache
//=========================================================================================

/// Typed, best-effort access to a [`CacheService`] backend.
///
/// Keys whose invalidation failed are remembered as suspect. A suspect key is
/// never served: each read retries the delete and reports a miss, and the
/// next successful write of a fresh value clears the mark. A mark older than
/// the TTL is dropped, since the stale backend entry has expired by then.
pub struct ScopedCache {
    backend: Arc<dyn CacheService>,
    ttl: Duration,
    suspect: Mutex<HashMap<String, Instant>>,
}

impl ScopedCache {
    pub fn new(backend: Arc<dyn CacheService>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            suspect: Mutex::new(HashMap::new()),
        }
    }

    /// Keys whose last invalidation attempt failed within the TTL.
    pub fn suspect_keys(&self) -> Vec<String> {
        let mut suspect = self.suspect.lock();
        self.prune(&mut suspect);
        suspect.keys().cloned().collect()
    }

    /// Probes the cache; any fault or undecodable entry is a miss.
    pub async fn read<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let key = key.to_string();

        if self.is_suspect(&key) {
            self.retry_delete(&key).await;
            return None;
        }

        match self.backend.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(key = %key, "cache hit");
                    Some(value)
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => {
                debug!(key = %key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, falling through to store");
                None
            }
        }
    }

    /// Stores a freshly loaded value with the fixed expiration.
    pub async fn write<T: Serialize>(&self, key: &CacheKey, value: &T) {
        let key = key.to_string();
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize cache entry");
                return;
            }
        };

        match self.backend.set(&key, &raw, self.ttl).await {
            // A fresh value overwrote whatever stale entry was left behind.
            Ok(()) => {
                self.suspect.lock().remove(&key);
            }
            Err(e) => warn!(key = %key, error = %e, "Cache write failed"),
        }
    }

    /// Deletes every key a committed mutation made stale.
    pub async fn invalidate(&self, mutation: &Mutation) {
        for key in mutation.affected_keys() {
            let key = key.to_string();
            if let Err(e) = self.backend.delete(&key).await {
                warn!(key = %key, error = %e, "Cache invalidation failed, marking key suspect");
                let mut suspect = self.suspect.lock();
                self.prune(&mut suspect);
                suspect.insert(key, Instant::now());
            }
        }
    }

    /// Returns the cached value for `key`, or loads it, caches it and returns it.
    /// Load failures propagate and leave the cache untouched.
    pub async fn read_through<T, E, F, Fut>(&self, key: CacheKey, load: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.read::<T>(&key).await {
            return Ok(hit);
        }
        let fresh = load().await?;
        self.write(&key, &fresh).await;
        Ok(fresh)
    }

    fn is_suspect(&self, key: &str) -> bool {
        let mut suspect = self.suspect.lock();
        self.prune(&mut suspect);
        suspect.contains_key(key)
    }

    fn prune(&self, suspect: &mut HashMap<String, Instant>) {
        suspect.retain(|_, marked_at| marked_at.elapsed() < self.ttl);
    }

    async fn retry_delete(&self, key: &str) {
        match self.backend.delete(key).await {
            Ok(()) => {
                debug!(key = %key, "Retried invalidation succeeded");
                self.suspect.lock().remove(key);
            }
            Err(e) => warn!(key = %key, error = %e, "Retried invalidation failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct FlakyCache {
        entries: Mutex<HashMap<String, String>>,
        fail_deletes: AtomicBool,
        fail_reads: AtomicBool,
    }

    #[async_trait]
    impl CacheService for FlakyCache {
        async fn get(&self, key: &str) -> PortResult<Option<String>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(PortError::Unexpected("connection refused".into()));
            }
            Ok(self.entries.lock().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str, _ttl: Duration) -> PortResult<()> {
            self.entries.lock().insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> PortResult<()> {
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(PortError::Unexpected("connection refused".into()));
            }
            self.entries.lock().remove(key);
            Ok(())
        }
    }

    fn ids() -> (Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn key_shapes() {
        let (chat, lecture) = ids();
        assert_eq!(
            CacheKey::Chats { user_id: chat }.to_string(),
            format!("chats:{}", chat)
        );
        assert_eq!(
            CacheKey::Lectures { chat_id: chat }.to_string(),
            format!("lectures:{}", chat)
        );
        assert_eq!(
            CacheKey::Lecture {
                chat_id: chat,
                lecture_id: lecture
            }
            .to_string(),
            format!("lecture:{}:{}", chat, lecture)
        );
        assert_eq!(
            CacheKey::Flashcards {
                chat_id: chat,
                lecture_id: lecture
            }
            .to_string(),
            format!("flashcards:{}:{}", chat, lecture)
        );
    }

    #[test]
    fn flashcard_writes_fan_out_to_three_views() {
        let (chat_id, lecture_id) = ids();
        for mutation in [
            Mutation::FlashcardsCreated {
                chat_id,
                lecture_id,
            },
            Mutation::FlashcardUpdated {
                chat_id,
                lecture_id,
            },
        ] {
            let keys: HashSet<_> = mutation.affected_keys().into_iter().collect();
            assert_eq!(keys.len(), 3);
            assert!(keys.contains(&CacheKey::Flashcards {
                chat_id,
                lecture_id
            }));
            assert!(keys.contains(&CacheKey::Lectures { chat_id }));
            assert!(keys.contains(&CacheKey::Lecture {
                chat_id,
                lecture_id
            }));
        }
    }

    #[test]
    fn notes_update_leaves_flashcard_list_alone() {
        let (chat_id, lecture_id) = ids();
        let keys = Mutation::LectureNotesUpdated {
            chat_id,
            lecture_id,
        }
        .affected_keys();
        assert!(!keys.contains(&CacheKey::Flashcards {
            chat_id,
            lecture_id
        }));
        assert_eq!(keys.len(), 2);
    }

    #[tokio::test]
    async fn read_fault_is_a_miss() {
        let backend = Arc::new(FlakyCache::default());
        let cache = ScopedCache::new(backend.clone(), DEFAULT_CACHE_TTL);
        let key = CacheKey::Chats {
            user_id: Uuid::new_v4(),
        };
        cache.write(&key, &vec![1, 2, 3]).await;
        backend.fail_reads.store(true, Ordering::SeqCst);

        let loaded: Result<Vec<i32>, ()> = cache.read_through(key, || async { Ok(vec![9]) }).await;
        assert_eq!(loaded, Ok(vec![9]));
    }

    #[tokio::test]
    async fn undecodable_entry_is_a_miss() {
        let backend = Arc::new(FlakyCache::default());
        let cache = ScopedCache::new(backend.clone(), DEFAULT_CACHE_TTL);
        let key = CacheKey::Lectures {
            chat_id: Uuid::new_v4(),
        };
        backend
            .entries
            .lock()
            .insert(key.to_string(), "not json".into());

        assert_eq!(cache.read::<Vec<String>>(&key).await, None);
    }

    #[tokio::test]
    async fn failed_invalidation_marks_key_suspect_until_healed() {
        let backend = Arc::new(FlakyCache::default());
        let cache = ScopedCache::new(backend.clone(), DEFAULT_CACHE_TTL);
        let owner_id = Uuid::new_v4();
        let key = CacheKey::Chats { user_id: owner_id };
        cache.write(&key, &"stale").await;

        backend.fail_deletes.store(true, Ordering::SeqCst);
        cache.invalidate(&Mutation::ChatCreated { owner_id }).await;
        assert_eq!(cache.suspect_keys(), vec![key.to_string()]);

        // The stale entry is still physically present but must not be served.
        assert_eq!(cache.read::<String>(&key).await, None);

        backend.fail_deletes.store(false, Ordering::SeqCst);
        assert_eq!(cache.read::<String>(&key).await, None);
        assert!(cache.suspect_keys().is_empty());
        assert!(backend.entries.lock().get(&key.to_string()).is_none());
    }

    #[tokio::test]
    async fn suspect_marks_lapse_with_the_ttl() {
        let backend = Arc::new(FlakyCache::default());
        let cache = ScopedCache::new(backend.clone(), Duration::from_millis(50));
        let owner_id = Uuid::new_v4();

        backend.fail_deletes.store(true, Ordering::SeqCst);
        cache.invalidate(&Mutation::ChatCreated { owner_id }).await;
        assert_eq!(cache.suspect_keys().len(), 1);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.suspect_keys().is_empty());
    }

    #[tokio::test]
    async fn load_failure_leaves_cache_empty() {
        let backend = Arc::new(FlakyCache::default());
        let cache = ScopedCache::new(backend.clone(), DEFAULT_CACHE_TTL);
        let key = CacheKey::Chats {
            user_id: Uuid::new_v4(),
        };
        let result: Result<Vec<i32>, &str> = cache.read_through(key, || async { Err("down") }).await;
        assert_eq!(result, Err("down"));
        assert!(backend.entries.lock().is_empty());
    }
}
