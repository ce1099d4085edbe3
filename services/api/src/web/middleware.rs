//! services/api/src/web/middleware.rs
//!
//! Session authentication: cookie parsing, token resolution, and the
//! middleware protecting the authenticated routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::error;
use tutor_core::domain::User;
use tutor_core::ports::{DatabaseService, PortResult};

use crate::web::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_token";

/// Pulls the session token out of the request's `Cookie` header, if any.
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').find_map(|c| {
        let c = c.trim();
        c.strip_prefix(SESSION_COOKIE)?.strip_prefix('=')
    })
}

/// Resolves an optional session token to the bound user.
///
/// A missing, unknown, or expired token is the normal "no identity" outcome,
/// not an error; only the database itself failing surfaces as `Err`. An
/// expired session is deleted on first use, so a second lookup with the same
/// token takes the unknown-token path.
pub async fn resolve_session(
    db: &dyn DatabaseService,
    token: Option<&str>,
) -> PortResult<Option<User>> {
    let Some(token) = token else {
        return Ok(None);
    };

    let Some(session) = db.find_session(token).await? else {
        return Ok(None);
    };

    if session.is_expired(Utc::now()) {
        db.delete_session(token).await?;
        return Ok(None);
    }

    // A dangling user_id is a data inconsistency; treat it as no identity.
    db.find_user_by_id(session.user_id).await
}

/// Middleware that validates the session cookie and extracts the user.
///
/// If valid, inserts the `User` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let token = session_token_from_headers(req.headers()).map(str::to_owned);

    let user = resolve_session(state.db.as_ref(), token.as_deref())
        .await
        .map_err(|e| {
            error!("Failed to resolve session: {:?}", e);
            (StatusCode::UNAUTHORIZED, "Not authenticated".to_string())
        })?
        .ok_or((StatusCode::UNAUTHORIZED, "Not authenticated".to_string()))?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::testing::{sample_user, FakeDb};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    #[tokio::test]
    async fn absent_token_is_unauthenticated() {
        let db = FakeDb::default();
        let resolved = resolve_session(&db, None).await.unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn unknown_token_is_unauthenticated() {
        let db = FakeDb::default();
        let resolved = resolve_session(&db, Some("no-such-token")).await.unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn valid_session_resolves_the_bound_user() {
        let user = sample_user();
        let db = FakeDb::default()
            .with_user(user.clone())
            .with_session("tok", user.id, Utc::now() + Duration::days(7));

        let resolved = resolve_session(&db, Some("tok")).await.unwrap().unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.email, user.email);
    }

    #[tokio::test]
    async fn expired_session_is_rejected_and_deleted() {
        let user = sample_user();
        let db = FakeDb::default()
            .with_user(user.clone())
            .with_session("stale", user.id, Utc::now() - Duration::hours(1));

        let first = resolve_session(&db, Some("stale")).await.unwrap();
        assert!(first.is_none());
        assert_eq!(db.session_count(), 0);

        // Second lookup takes the unknown-token path, no error.
        let second = resolve_session(&db, Some("stale")).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn dangling_user_binding_is_unauthenticated() {
        let db = FakeDb::default().with_session(
            "orphan",
            Uuid::new_v4(),
            Utc::now() + Duration::days(1),
        );
        let resolved = resolve_session(&db, Some("orphan")).await.unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn cookie_parsing_finds_the_session_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; session_token=abc123; other=1".parse().unwrap(),
        );
        assert_eq!(session_token_from_headers(&headers), Some("abc123"));
    }

    #[test]
    fn cookie_parsing_ignores_prefix_collisions() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "session_token_backup=zzz".parse().unwrap(),
        );
        assert_eq!(session_token_from_headers(&headers), None);
    }
}
