//! Authentication: admin gate, password hashing and sign-in sessions.
//!
//! Admin routes accept either the pre-shared API key or a live session token.
//! Key comparison is constant-time to mitigate timing attacks.

mod passwords;
mod sessions;

pub use passwords::*;
pub use sessions::*;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;
use crate::AppState;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Admin gate for mutating and back-office routes.
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    // If no PSK is configured, allow all requests (dev mode)
    let Some(expected) = state.config.api_psk.as_deref() else {
        return next.run(request).await;
    };

    let headers = request.headers();

    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return if constant_time_compare(key, expected) {
            next.run(request).await
        } else {
            unauthorized("Invalid API key")
        };
    }

    let Some(bearer) = bearer_token(headers) else {
        return unauthorized("Missing API key or session token");
    };

    if constant_time_compare(bearer, expected) {
        return next.run(request).await;
    }

    match state.auth.current_user(bearer).await {
        Ok(Some(user)) => {
            tracing::debug!(user_id = %user.id, "Admin request via session");
            next.run(request).await
        }
        Ok(None) => unauthorized("Invalid or expired session"),
        Err(e) => e.into_response(),
    }
}

/// The token of an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unauthorized(message: &str) -> Response {
    AppError::Unauthorized(message.to_string()).into_response()
}
