// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava OAuth authentication routes.
//!
//! The OAuth `state` parameter is a random nonce kept in the server-side
//! session between the redirect to Strava and the callback. Callback
//! failures redirect back to the frontend with an `error` marker; details
//! stay in the logs.

use axum::{
    extract::{Query, State},
    middleware,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::require_csrf_if_authenticated;
use crate::session::{keys::random_bytes, SessionContext, SessionError};
use crate::AppState;

/// Longest authorization code accepted from the callback.
const MAX_CODE_LEN: usize = 512;

pub fn routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/strava", get(auth_start))
        .route("/auth/strava/callback", get(auth_callback))
        .route("/auth/status", get(auth_status))
        .route("/auth/csrf-token", get(csrf_token))
        .route(
            "/auth/logout",
            post(logout).route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_csrf_if_authenticated,
            )),
        )
}

/// Redirect back to the frontend with a query marker such as `auth=success`.
fn frontend_redirect(state: &AppState, marker: &str) -> Redirect {
    Redirect::temporary(&format!("{}?{}", state.config.frontend_url, marker))
}

/// Start OAuth flow - redirect to Strava authorization.
async fn auth_start(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    match begin_oauth(&state, &jar).await {
        Ok((session, nonce)) => {
            tracing::info!("Starting OAuth flow, redirecting to Strava");
            let jar = jar.add(state.sessions.session_cookie(&session));
            (
                jar,
                Redirect::temporary(&state.strava.authorization_url(&nonce)),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to save OAuth state");
            (jar, frontend_redirect(&state, "error=session_error"))
        }
    }
}

/// Store a fresh `state` nonce in the session.
async fn begin_oauth(
    state: &AppState,
    jar: &CookieJar,
) -> std::result::Result<(SessionContext, String), SessionError> {
    let mut session = state.sessions.load_or_create(jar).await?;
    let nonce: [u8; 32] = random_bytes()?;
    let nonce = hex::encode(nonce);

    session.data.oauth_state = Some(nonce.clone());
    state.sessions.save(&session).await?;
    Ok((session, nonce))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for tokens and mark the session authenticated.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Redirect) {
    if let Some(error) = params.error.as_deref() {
        tracing::warn!(error, "OAuth error from Strava");
        return (jar, frontend_redirect(&state, "error=access_denied"));
    }

    let mut session = match state.sessions.load(&jar).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            tracing::warn!("OAuth callback without a pending session");
            return (jar, frontend_redirect(&state, "error=invalid_state"));
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load session in OAuth callback");
            return (jar, frontend_redirect(&state, "error=session_error"));
        }
    };

    if !state_matches(
        session.data.oauth_state.as_deref(),
        params.state.as_deref(),
    ) {
        tracing::warn!("OAuth state mismatch, possible forged callback");
        return (jar, frontend_redirect(&state, "error=invalid_state"));
    }

    let Some(code) = params.code.as_deref().filter(|code| is_valid_code(code)) else {
        tracing::warn!("OAuth callback with missing or malformed code");
        return (jar, frontend_redirect(&state, "error=invalid_code"));
    };

    match complete_login(&state, &mut session, code).await {
        Ok(()) => {
            tracing::info!(athlete_id = ?session.data.athlete_id, "OAuth successful");
            let jar = jar.add(state.sessions.session_cookie(&session));
            (jar, frontend_redirect(&state, "auth=success"))
        }
        Err(e) => {
            tracing::error!(error = %e, "OAuth callback failed");
            (jar, frontend_redirect(&state, "error=auth_failed"))
        }
    }
}

/// Exchange the code, store the token triple and clear the nonce.
async fn complete_login(
    state: &AppState,
    session: &mut SessionContext,
    code: &str,
) -> Result<()> {
    tracing::info!("Exchanging authorization code for tokens");
    let response = state.strava.exchange_code(code).await?;

    session.data.tokens = Some(response.tokens());
    session.data.athlete_id = response.athlete.map(|athlete| athlete.id);
    session.data.oauth_state = None;
    state.sessions.save(session).await?;
    Ok(())
}

/// Constant-time comparison of the returned `state` with the stored nonce.
fn state_matches(expected: Option<&str>, received: Option<&str>) -> bool {
    match (expected, received) {
        (Some(expected), Some(received)) if !expected.is_empty() => {
            expected.as_bytes().ct_eq(received.as_bytes()).into()
        }
        _ => false,
    }
}

/// Authorization codes are short alphanumeric strings.
fn is_valid_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CODE_LEN
        && code.chars().all(|c| c.is_ascii_alphanumeric())
}

// ─── Session status ──────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
}

/// Whether the current session holds Strava tokens.
async fn auth_status(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<AuthStatusResponse>> {
    let authenticated = state
        .sessions
        .load(&jar)
        .await?
        .is_some_and(|session| session.data.is_authenticated());

    Ok(Json(AuthStatusResponse { authenticated }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CsrfTokenResponse {
    #[serde(rename = "csrfToken")]
    pub csrf_token: String,
}

/// Issue a CSRF token for the authenticated session.
async fn csrf_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<CsrfTokenResponse>> {
    let mut session = state
        .sessions
        .load(&jar)
        .await?
        .filter(|session| session.data.is_authenticated())
        .ok_or(AppError::Unauthorized)?;

    let (csrf_token, created) = state.sessions.issue_csrf_token(&mut session)?;
    if created {
        state.sessions.save(&session).await?;
    }

    Ok(Json(CsrfTokenResponse { csrf_token }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LogoutResponse {
    pub message: String,
}

/// Destroy the session and clear the cookie. Succeeds without a session too.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<LogoutResponse>)> {
    if let Some(session) = state.sessions.load(&jar).await? {
        state.sessions.destroy(&session.id).await?;
        tracing::info!(athlete_id = ?session.data.athlete_id, "Logged out");
    }

    let jar = jar.remove(state.sessions.removal_cookie());
    Ok((
        jar,
        Json(LogoutResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}
