//! Sign-in, sign-out and current-user endpoints.

use axum::{extract::State, http::HeaderMap, Json};

use super::{current_revision, error, success, ApiResult};
use crate::auth::bearer_token;
use crate::errors::AppError;
use crate::models::{Session, SignInRequest, UserAccount};
use crate::AppState;

/// POST /api/auth/sign-in - Exchange email and password for a session token.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> ApiResult<Session> {
    let revision_id = current_revision(&state).await;

    match state.auth.sign_in(&request.email, &request.password).await {
        Ok(session) => success(session, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/auth/sign-out - End the session named by the bearer token.
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<()> {
    let revision_id = current_revision(&state).await;

    let Some(token) = bearer_token(&headers) else {
        return error(
            AppError::Unauthorized("Missing session token".to_string()),
            revision_id,
        );
    };

    match state.auth.sign_out(token).await {
        Ok(()) => success((), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/auth/me - The user owning the bearer token.
pub async fn current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<UserAccount> {
    let revision_id = current_revision(&state).await;

    let Some(token) = bearer_token(&headers) else {
        return error(
            AppError::Unauthorized("Missing session token".to_string()),
            revision_id,
        );
    };

    match state.auth.current_user(token).await {
        Ok(Some(user)) => success(user, revision_id),
        Ok(None) => error(
            AppError::Unauthorized("Invalid or expired session".to_string()),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}
