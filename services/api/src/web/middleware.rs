//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::web::state::AppState;

/// The name of the cookie carrying the login session id.
pub const SESSION_COOKIE: &str = "session";

/// Reads the login session id out of the `Cookie` header, if there is one.
pub fn session_id_from(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| {
            c.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|id| !id.is_empty())
}

/// Middleware that validates the session cookie and resolves it to the caller's id.
///
/// On success the caller's `Uuid` is inserted into the request extensions, where
/// handlers pick it up with `Extension<Uuid>`. A missing, unknown or expired
/// session is answered with 401 before any handler runs.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let session_id = session_id_from(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let user_id = state
        .db
        .validate_auth_session(session_id)
        .await
        .map_err(|e| {
            debug!("Rejected auth session: {}", e);
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(user_id);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn finds_the_session_among_other_cookies() {
        let headers = with_cookie("theme=dark; session=abc123; lang=en");
        assert_eq!(session_id_from(&headers), Some("abc123"));
    }

    #[test]
    fn ignores_lookalike_cookie_names() {
        let headers = with_cookie("session_hint=zzz");
        assert_eq!(session_id_from(&headers), None);
    }

    #[test]
    fn an_empty_session_is_no_session() {
        assert_eq!(session_id_from(&with_cookie("session=")), None);
        assert_eq!(session_id_from(&HeaderMap::new()), None);
    }
}
