//! services/api/src/web/generate.rs
//!
//! Stateless generation endpoints: cards from ad-hoc notes, and a fixed sample deck.

use crate::adapters::canned_cards;
use crate::web::rest::rejection;
use crate::web::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use flashmind_core::views::CardView;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct GenerateRequest {
    #[serde(default)]
    pub notes: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    pub cards: Vec<CardView>,
}

/// Generates flashcards from the posted notes without saving them.
#[utoipa::path(
    post,
    path = "/api/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Generated cards", body = GenerateResponse),
        (status = 400, description = "Notes shorter than ten characters"),
        (status = 502, description = "Generator failed or timed out")
    )
)]
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, String)> {
    let cards = state
        .resources
        .generate_cards(&req.notes)
        .await
        .map_err(rejection)?;
    Ok(Json(GenerateResponse {
        cards: cards.into_iter().map(CardView::from).collect(),
    }))
}

/// Returns the fixed sample deck. Useful for exercising a client without a model.
#[utoipa::path(
    post,
    path = "/api/generate/dummy",
    responses((status = 200, description = "The sample deck", body = GenerateResponse))
)]
pub async fn generate_dummy_handler() -> Json<GenerateResponse> {
    Json(GenerateResponse {
        cards: canned_cards().into_iter().map(CardView::from).collect(),
    })
}
