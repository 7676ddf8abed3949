pub mod auth;
pub mod generate;
pub mod middleware;
pub mod rest;
pub mod router;
pub mod state;

pub use middleware::require_auth;
pub use router::build_router;
pub use state::AppState;
