// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSRF token check for state-changing requests.
//!
//! Tokens are issued by `GET /auth/csrf-token` and sent back in the
//! `X-CSRF-Token` (or `X-XSRF-Token`) header. Safe methods pass through.

use crate::error::AppError;
use crate::session::SessionContext;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

pub const CSRF_HEADER: &str = "x-csrf-token";
pub const XSRF_HEADER: &str = "x-xsrf-token";

/// Reject state-changing requests without a valid CSRF token.
pub async fn require_csrf(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_safe_method(request.method()) {
        return Ok(next.run(request).await);
    }

    let session = state
        .sessions
        .load(&jar)
        .await?
        .ok_or(AppError::InvalidCsrfToken)?;
    check_token(&state, &session, request.headers())?;

    Ok(next.run(request).await)
}

/// Like [`require_csrf`], but only for sessions holding Strava tokens.
///
/// Used for logout, which succeeds trivially when there is nothing to end.
/// A session still waiting on the OAuth callback has no CSRF secret yet.
pub async fn require_csrf_if_authenticated(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !is_safe_method(request.method()) {
        let session = state
            .sessions
            .load(&jar)
            .await?
            .filter(|session| session.data.is_authenticated());
        if let Some(session) = session {
            check_token(&state, &session, request.headers())?;
        }
    }

    Ok(next.run(request).await)
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn check_token(
    state: &AppState,
    session: &SessionContext,
    headers: &HeaderMap,
) -> Result<(), AppError> {
    let token = headers
        .get(CSRF_HEADER)
        .or_else(|| headers.get(XSRF_HEADER))
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if token.is_empty() || !state.sessions.verify_csrf_token(session, token) {
        tracing::warn!("Rejected request with invalid CSRF token");
        return Err(AppError::InvalidCsrfToken);
    }
    Ok(())
}
