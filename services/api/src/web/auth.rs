//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: identity-provider session exchange, current-user
//! lookup, logout, and learning-interest updates.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use tutor_core::domain::User;
use tutor_core::ports::PortError;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::{session_token_from_headers, SESSION_COOKIE};
use crate::web::state::AppState;

/// Sessions issued by the exchange live for seven days.
const SESSION_TTL_DAYS: i64 = 7;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SessionDataRequest {
    pub session_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateInterestsRequest {
    pub interests: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub learning_interests: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            picture: user.picture,
            learning_interests: user.learning_interests,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub user: UserResponse,
    pub session_token: String,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Builds the Set-Cookie value carrying the session token. The frontend is
/// served from a different origin, hence SameSite=None.
fn session_cookie(token: &str, max_age_seconds: i64) -> String {
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Secure; SameSite=None; Path=/; Max-Age={max_age_seconds}"
    )
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/session - Exchange an identity-provider session id for a
/// logged-in session.
#[utoipa::path(
    post,
    path = "/api/auth/session",
    request_body = SessionDataRequest,
    responses(
        (status = 200, description = "Session established, cookie set", body = SessionResponse),
        (status = 400, description = "Invalid session ID"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn process_session_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionDataRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Exchange the opaque session id with the identity provider.
    let profile = state
        .identity
        .exchange_session(&req.session_id)
        .await
        .map_err(|e| match e {
            PortError::InvalidRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            other => {
                error!("Session processing internal error: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        })?;

    // 2. Find or create the user by email. First write wins: name and picture
    //    are never updated on later logins.
    let internal = |e: PortError| {
        error!("Session processing internal error: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    let user = match state.db.find_user_by_email(&profile.email).await.map_err(internal)? {
        Some(existing) => existing,
        None => {
            let created = state.db.create_user(&profile).await.map_err(internal)?;
            // A new user starts with a zeroed progress ledger.
            state.db.create_progress(created.id).await.map_err(internal)?;
            created
        }
    };

    // 3. Always insert a fresh session; a user may hold several at once.
    let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);
    state
        .db
        .create_session(&profile.session_token, user.id, expires_at)
        .await
        .map_err(internal)?;

    let cookie = session_cookie(
        &profile.session_token,
        Duration::days(SESSION_TTL_DAYS).num_seconds(),
    );

    let response = SessionResponse {
        user: user.into(),
        session_token: profile.session_token,
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// GET /api/auth/me - The user bound to the session cookie.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me_handler(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(user.into())
}

/// POST /api/auth/logout - Delete the session (if any) and clear the cookie.
///
/// Deliberately tolerant: callers without a valid cookie still get a 200 and
/// a cleared cookie.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out, cookie cleared", body = MessageResponse)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Some(token) = session_token_from_headers(&headers) {
        state.db.delete_session(token).await.map_err(|e| {
            error!("Failed to delete session on logout: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to logout".to_string(),
            )
        })?;
    }

    let cookie = session_cookie("", 0);
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

/// PUT /api/auth/interests - Replace the user's learning interests.
#[utoipa::path(
    put,
    path = "/api/auth/interests",
    request_body = UpdateInterestsRequest,
    responses(
        (status = 200, description = "Interests updated", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn update_interests_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<UpdateInterestsRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    state
        .db
        .update_user_interests(user.id, &req.interests)
        .await
        .map_err(|e| {
            error!("Failed to update interests: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(MessageResponse {
        message: "Interests updated".to_string(),
    }))
}
