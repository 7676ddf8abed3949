//! crates/flashmind_core/src/authz.rs
//!
//! Ownership check at the root of the Flashcard -> Lecture -> Chat -> User chain.

use crate::domain::Chat;
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{DatabaseService, PortError};
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

/// Confirms a chat belongs to the caller before any chat-scoped cache or store access.
#[derive(Clone)]
pub struct AuthorizationGate {
    db: Arc<dyn DatabaseService>,
}

impl AuthorizationGate {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Returns the chat if `caller_id` owns it.
    ///
    /// A chat that does not exist and a chat owned by someone else both
    /// yield `Forbidden`.
    pub async fn authorize_chat_access(
        &self,
        caller_id: Uuid,
        chat_id: Uuid,
    ) -> ServiceResult<Chat> {
        let chat = match self.db.get_chat(chat_id).await {
            Ok(chat) => chat,
            Err(PortError::NotFound(_)) => {
                warn!(%caller_id, %chat_id, "Chat access denied: no such chat");
                return Err(ServiceError::Forbidden);
            }
            Err(e) => {
                error!(%caller_id, %chat_id, "Failed to load chat for authorization: {:?}", e);
                return Err(e.into());
            }
        };

        if chat.owner_id != caller_id {
            warn!(%caller_id, %chat_id, "Chat access denied: caller is not the owner");
            return Err(ServiceError::Forbidden);
        }

        Ok(chat)
    }
}
