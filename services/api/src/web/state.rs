//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use flashmind_core::ports::DatabaseService;
use flashmind_core::service::ResourceService;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Used directly only by the account endpoints and the auth middleware.
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub resources: Arc<ResourceService>,
}
