//! services/api/src/web/auth.rs
//!
//! Account endpoints. A successful signup or login opens a server-side session
//! and hands its id back in an HttpOnly cookie.

use crate::web::middleware::{session_id_from, SESSION_COOKIE};
use crate::web::state::AppState;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use flashmind_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub username: String,
}

type Rejection = (StatusCode, String);

fn internal(context: &str) -> impl FnOnce(PortError) -> Rejection + '_ {
    move |e| {
        error!("{}: {:?}", context, e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    }
}

/// Trims the username and checks both fields are present.
fn validated(req: &Credentials) -> Result<&str, Rejection> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Username and password are required".to_string(),
        ));
    }
    Ok(username)
}

/// Opens a login session for `user_id` and builds the `Set-Cookie` value for it.
async fn open_session(state: &AppState, user_id: Uuid) -> Result<String, Rejection> {
    let auth_session_id = Uuid::new_v4().to_string();
    let lifetime = Duration::days(state.config.session_ttl_days);

    state
        .db
        .create_auth_session(&auth_session_id, user_id, Utc::now() + lifetime)
        .await
        .map_err(internal("Failed to create auth session"))?;

    Ok(format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        auth_session_id,
        lifetime.num_seconds()
    ))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Registers a username and logs the new user in.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = Credentials,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Missing username or password"),
        (status = 409, description = "Username already taken"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Credentials>,
) -> Result<impl IntoResponse, Rejection> {
    let username = validated(&req)?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
        })?
        .to_string();

    let user = match state.db.create_user(username, &password_hash).await {
        Ok(user) => user,
        Err(PortError::Conflict(_)) => {
            return Err((StatusCode::CONFLICT, "Username already taken".to_string()))
        }
        Err(e) => return Err(internal("Failed to create user")(e)),
    };
    info!(user_id = %user.id, "User signed up.");

    let cookie = open_session(&state, user.id).await?;
    let response = AuthResponse {
        user_id: user.id,
        username: user.username,
    };
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(response),
    ))
}

/// Verifies the password and opens a fresh session.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Credentials>,
) -> Result<impl IntoResponse, Rejection> {
    let username = validated(&req)?;
    let invalid = || {
        (
            StatusCode::UNAUTHORIZED,
            "Invalid username or password".to_string(),
        )
    };

    let user_creds = match state.db.get_user_by_username(username).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => return Err(invalid()),
        Err(e) => return Err(internal("Failed to get user")(e)),
    };

    let parsed_hash = PasswordHash::new(&user_creds.password_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    })?;
    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid());
    }

    let cookie = open_session(&state, user_creds.id).await?;
    let response = AuthResponse {
        user_id: user_creds.id,
        username: user_creds.username,
    };
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// Deletes the caller's session and expires the cookie.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, Rejection> {
    let auth_session_id = session_id_from(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    state
        .db
        .delete_auth_session(auth_session_id)
        .await
        .map_err(internal("Failed to delete auth session"))?;

    let cookie = format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    );
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}
