// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware with access token refresh.

use crate::error::AppError;
use crate::session::{SessionContext, SessionId};
use crate::time_utils::now_unix;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Authenticated session, inserted as a request extension once the access
/// token is known to be current.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: SessionId,
    /// Strava athlete that owns the session
    pub athlete_id: Option<u64>,
    pub access_token: String,
}

/// Middleware that requires a session holding Strava tokens.
///
/// An expired access token is refreshed once before the handler runs. If the
/// refresh fails, or its result cannot be saved, the session is destroyed and
/// the cookie cleared.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(mut session) = state.sessions.load(&jar).await? else {
        return Err(AppError::Unauthorized);
    };
    let Some(tokens) = session.data.tokens.clone() else {
        return Err(AppError::Unauthorized);
    };

    let access_token = if tokens.is_expired_at(now_unix()) {
        match refresh_session(&state, &mut session, &tokens.refresh_token).await {
            Ok(access_token) => access_token,
            Err(e) => {
                tracing::warn!(
                    athlete_id = ?session.data.athlete_id,
                    error = %e,
                    "Token refresh failed, ending session"
                );
                if let Err(e) = state.sessions.destroy(&session.id).await {
                    tracing::error!(error = %e, "Failed to destroy session");
                }
                let jar = jar.remove(state.sessions.removal_cookie());
                return Ok((jar, AppError::Unauthorized).into_response());
            }
        }
    } else {
        tokens.access_token
    };

    request.extensions_mut().insert(AuthSession {
        session_id: session.id,
        athlete_id: session.data.athlete_id,
        access_token,
    });

    Ok(next.run(request).await)
}

/// Exchange the refresh token and persist the new triple.
///
/// Strava may rotate the refresh token, so a session that cannot be saved
/// afterwards is as dead as one whose refresh was rejected.
async fn refresh_session(
    state: &AppState,
    session: &mut SessionContext,
    refresh_token: &str,
) -> Result<String, AppError> {
    let fresh = state.strava.refresh_token(refresh_token).await?.tokens();
    let access_token = fresh.access_token.clone();
    session.data.tokens = Some(fresh);
    state.sessions.save(session).await?;

    tracing::info!(
        athlete_id = ?session.data.athlete_id,
        "Access token refreshed"
    );
    Ok(access_token)
}
