//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the chat, lecture and flashcard endpoints and
//! the master definition for the OpenAPI specification.

use crate::web::auth::{self, AuthResponse, Credentials};
use crate::web::generate::{self, GenerateRequest, GenerateResponse};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use flashmind_core::domain::CardPair;
use flashmind_core::error::ServiceError;
use flashmind_core::views::{CardView, ChatView, FlashcardView, LectureDetailView, LectureView};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        create_chat_handler,
        list_chats_handler,
        create_lecture_handler,
        list_lectures_handler,
        get_lecture_handler,
        update_lecture_notes_handler,
        list_flashcards_handler,
        create_flashcards_handler,
        generate_lecture_flashcards_handler,
        update_flashcard_status_handler,
        generate::generate_handler,
        generate::generate_dummy_handler,
    ),
    components(
        schemas(
            Credentials, AuthResponse,
            ChatView, LectureView, LectureDetailView, FlashcardView, CardView,
            NameRequest, NotesRequest, CreateFlashcardsRequest, FlashcardStatusRequest,
            GenerateRequest, GenerateResponse,
        )
    ),
    tags(
        (name = "FlashMind API", description = "Chats, lectures and flashcards for studying.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Request Payloads
//=========================================================================================

/// Body for creating a chat or a lecture.
#[derive(Deserialize, ToSchema)]
pub struct NameRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct NotesRequest {
    pub notes: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateFlashcardsRequest {
    pub cards: Vec<CardView>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardStatusRequest {
    #[serde(default)]
    pub is_known: bool,
    #[serde(default)]
    pub is_review: bool,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps a service failure onto a status code and a client-safe message.
/// Upstream and internal details are logged here and never sent to the client.
pub fn rejection(err: ServiceError) -> (StatusCode, String) {
    match err {
        ServiceError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthenticated".into()),
        ServiceError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".into()),
        ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        ServiceError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        ServiceError::UpstreamGeneration(msg) => {
            error!("Flashcard generation failed: {}", msg);
            (StatusCode::BAD_GATEWAY, "Flashcard generation failed".into())
        }
        ServiceError::UpstreamMalformed(msg) => {
            error!("Flashcard generator returned unusable output: {}", msg);
            (
                StatusCode::BAD_GATEWAY,
                "Flashcard generator returned an unexpected response".into(),
            )
        }
        ServiceError::Internal(msg) => {
            error!("Internal error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            )
        }
    }
}

//=========================================================================================
// Chats
//=========================================================================================

#[utoipa::path(
    post,
    path = "/api/chats",
    request_body = NameRequest,
    responses(
        (status = 201, description = "Chat created", body = ChatView),
        (status = 400, description = "Blank name"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn create_chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<NameRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let chat = state
        .resources
        .create_chat(user_id, &req.name)
        .await
        .map_err(rejection)?;
    Ok((StatusCode::CREATED, Json(chat)))
}

/// Lists the caller's chats in creation order.
#[utoipa::path(
    get,
    path = "/api/chats",
    responses(
        (status = 200, description = "The caller's chats", body = [ChatView]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_chats_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<ChatView>>, (StatusCode, String)> {
    state
        .resources
        .list_chats(user_id)
        .await
        .map(Json)
        .map_err(rejection)
}

//=========================================================================================
// Lectures
//=========================================================================================

#[utoipa::path(
    post,
    path = "/api/chats/{chat_id}/lectures",
    request_body = NameRequest,
    params(("chat_id" = Uuid, Path, description = "The owning chat.")),
    responses(
        (status = 201, description = "Lecture created", body = LectureView),
        (status = 400, description = "Blank name"),
        (status = 403, description = "Chat is missing or belongs to someone else")
    )
)]
pub async fn create_lecture_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(chat_id): Path<Uuid>,
    Json(req): Json<NameRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let lecture = state
        .resources
        .create_lecture(user_id, chat_id, &req.name)
        .await
        .map_err(rejection)?;
    Ok((StatusCode::CREATED, Json(lecture)))
}

#[utoipa::path(
    get,
    path = "/api/chats/{chat_id}/lectures",
    params(("chat_id" = Uuid, Path, description = "The owning chat.")),
    responses(
        (status = 200, description = "The chat's lectures", body = [LectureView]),
        (status = 403, description = "Chat is missing or belongs to someone else")
    )
)]
pub async fn list_lectures_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Vec<LectureView>>, (StatusCode, String)> {
    state
        .resources
        .list_lectures(user_id, chat_id)
        .await
        .map(Json)
        .map_err(rejection)
}

/// Returns one lecture with its notes and flashcards.
#[utoipa::path(
    get,
    path = "/api/chats/{chat_id}/lectures/{lecture_id}",
    params(
        ("chat_id" = Uuid, Path, description = "The owning chat."),
        ("lecture_id" = Uuid, Path, description = "The lecture.")
    ),
    responses(
        (status = 200, description = "The lecture", body = LectureDetailView),
        (status = 403, description = "Chat is missing or belongs to someone else"),
        (status = 404, description = "No such lecture in this chat")
    )
)]
pub async fn get_lecture_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path((chat_id, lecture_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<LectureDetailView>, (StatusCode, String)> {
    state
        .resources
        .get_lecture(user_id, chat_id, lecture_id)
        .await
        .map(Json)
        .map_err(rejection)
}

#[utoipa::path(
    put,
    path = "/api/chats/{chat_id}/lectures/{lecture_id}/notes",
    request_body = NotesRequest,
    params(
        ("chat_id" = Uuid, Path, description = "The owning chat."),
        ("lecture_id" = Uuid, Path, description = "The lecture.")
    ),
    responses(
        (status = 200, description = "Notes replaced", body = LectureView),
        (status = 403, description = "Chat is missing or belongs to someone else"),
        (status = 404, description = "No such lecture in this chat")
    )
)]
pub async fn update_lecture_notes_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path((chat_id, lecture_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<NotesRequest>,
) -> Result<Json<LectureView>, (StatusCode, String)> {
    state
        .resources
        .update_lecture_notes(user_id, chat_id, lecture_id, &req.notes)
        .await
        .map(Json)
        .map_err(rejection)
}

//=========================================================================================
// Flashcards
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/chats/{chat_id}/lectures/{lecture_id}/flashcards",
    params(
        ("chat_id" = Uuid, Path, description = "The owning chat."),
        ("lecture_id" = Uuid, Path, description = "The lecture.")
    ),
    responses(
        (status = 200, description = "The lecture's flashcards", body = [FlashcardView]),
        (status = 403, description = "Chat is missing or belongs to someone else"),
        (status = 404, description = "No such lecture in this chat")
    )
)]
pub async fn list_flashcards_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path((chat_id, lecture_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<FlashcardView>>, (StatusCode, String)> {
    state
        .resources
        .list_flashcards(user_id, chat_id, lecture_id)
        .await
        .map(Json)
        .map_err(rejection)
}

/// Appends a batch of cards to the lecture. Existing cards are kept.
#[utoipa::path(
    post,
    path = "/api/chats/{chat_id}/lectures/{lecture_id}/flashcards",
    request_body = CreateFlashcardsRequest,
    params(
        ("chat_id" = Uuid, Path, description = "The owning chat."),
        ("lecture_id" = Uuid, Path, description = "The lecture.")
    ),
    responses(
        (status = 201, description = "Cards created", body = [FlashcardView]),
        (status = 400, description = "Empty batch or blank card"),
        (status = 403, description = "Chat is missing or belongs to someone else"),
        (status = 404, description = "No such lecture in this chat")
    )
)]
pub async fn create_flashcards_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path((chat_id, lecture_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<CreateFlashcardsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let pairs: Vec<CardPair> = req.cards.into_iter().map(CardPair::from).collect();
    let cards = state
        .resources
        .create_flashcards(user_id, chat_id, lecture_id, &pairs)
        .await
        .map_err(rejection)?;
    Ok((StatusCode::CREATED, Json(cards)))
}

/// Generates cards from the lecture's saved notes and appends them.
#[utoipa::path(
    post,
    path = "/api/chats/{chat_id}/lectures/{lecture_id}/flashcards/generate",
    params(
        ("chat_id" = Uuid, Path, description = "The owning chat."),
        ("lecture_id" = Uuid, Path, description = "The lecture.")
    ),
    responses(
        (status = 201, description = "Cards generated and saved", body = [FlashcardView]),
        (status = 400, description = "Notes too short"),
        (status = 403, description = "Chat is missing or belongs to someone else"),
        (status = 502, description = "Generator failed or timed out")
    )
)]
pub async fn generate_lecture_flashcards_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path((chat_id, lecture_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let cards = state
        .resources
        .generate_lecture_flashcards(user_id, chat_id, lecture_id)
        .await
        .map_err(rejection)?;
    Ok((StatusCode::CREATED, Json(cards)))
}

#[utoipa::path(
    patch,
    path = "/api/chats/{chat_id}/lectures/{lecture_id}/flashcards/{flashcard_id}",
    request_body = FlashcardStatusRequest,
    params(
        ("chat_id" = Uuid, Path, description = "The owning chat."),
        ("lecture_id" = Uuid, Path, description = "The lecture."),
        ("flashcard_id" = Uuid, Path, description = "The flashcard.")
    ),
    responses(
        (status = 200, description = "Status updated", body = FlashcardView),
        (status = 400, description = "Both flags set"),
        (status = 403, description = "Chat is missing or belongs to someone else"),
        (status = 404, description = "No such flashcard in this lecture")
    )
)]
pub async fn update_flashcard_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path((chat_id, lecture_id, flashcard_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(req): Json<FlashcardStatusRequest>,
) -> Result<Json<FlashcardView>, (StatusCode, String)> {
    state
        .resources
        .update_flashcard_status(
            user_id,
            chat_id,
            lecture_id,
            flashcard_id,
            req.is_known,
            req.is_review,
        )
        .await
        .map(Json)
        .map_err(rejection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_details_are_not_echoed() {
        let (status, body) = rejection(ServiceError::Internal("pool timed out on 10.0.0.3".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("10.0.0.3"));

        let (status, body) = rejection(ServiceError::UpstreamMalformed("raw: {oops".into()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body.contains("oops"));
    }

    #[test]
    fn client_errors_map_to_their_codes() {
        assert_eq!(rejection(ServiceError::Unauthenticated).0, StatusCode::UNAUTHORIZED);
        assert_eq!(rejection(ServiceError::Forbidden).0, StatusCode::FORBIDDEN);
        assert_eq!(rejection(ServiceError::NotFound("x".into())).0, StatusCode::NOT_FOUND);
        assert_eq!(rejection(ServiceError::Validation("x".into())).0, StatusCode::BAD_REQUEST);
        assert_eq!(rejection(ServiceError::Conflict("x".into())).0, StatusCode::CONFLICT);
        assert_eq!(
            rejection(ServiceError::UpstreamGeneration("x".into())).0,
            StatusCode::BAD_GATEWAY
        );
    }
}
