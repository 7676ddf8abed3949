//! services/api/src/web/router.rs
//!
//! Assembles the HTTP router: public account routes, session-protected resource
//! routes, CORS, and the Swagger UI.

use crate::error::ApiError;
use crate::web::{
    auth::{login_handler, logout_handler, signup_handler},
    generate::{generate_dummy_handler, generate_handler},
    middleware::require_auth,
    rest::{self, ApiDoc},
    state::AppState,
};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the complete application router over the given state.
pub fn build_router(state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = state.config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", state.config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/chats",
            post(rest::create_chat_handler).get(rest::list_chats_handler),
        )
        .route(
            "/chats/{chat_id}/lectures",
            post(rest::create_lecture_handler).get(rest::list_lectures_handler),
        )
        .route(
            "/chats/{chat_id}/lectures/{lecture_id}",
            get(rest::get_lecture_handler),
        )
        .route(
            "/chats/{chat_id}/lectures/{lecture_id}/notes",
            put(rest::update_lecture_notes_handler),
        )
        .route(
            "/chats/{chat_id}/lectures/{lecture_id}/flashcards",
            get(rest::list_flashcards_handler).post(rest::create_flashcards_handler),
        )
        .route(
            "/chats/{chat_id}/lectures/{lecture_id}/flashcards/generate",
            post(rest::generate_lecture_flashcards_handler),
        )
        .route(
            "/chats/{chat_id}/lectures/{lecture_id}/flashcards/{flashcard_id}",
            patch(rest::update_flashcard_status_handler),
        )
        .route("/generate", post(generate_handler))
        .route("/generate/dummy", post(generate_dummy_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .with_state(state);

    Ok(Router::new()
        .nest("/api", api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
