// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side sessions.
//!
//! The browser only ever holds a signed, opaque session id. Everything else
//! (Strava tokens, the OAuth `state` nonce, the CSRF secret) lives in a
//! [`SessionStore`] keyed by that id. Handlers receive the loaded session as
//! an explicit [`SessionContext`] value from [`SessionManager`].

pub mod keys;
pub mod store;

pub use keys::SessionKeys;
pub use store::MemorySessionStore;

use crate::config::Config;
use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Session lifetime (matches the cookie `Max-Age`).
pub const SESSION_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Strava OAuth token triple.
///
/// The three fields are only ever replaced together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StravaTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry (Unix seconds)
    pub expires_at: i64,
}

impl StravaTokens {
    /// Whether the access token has expired at `now` (Unix seconds).
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// Data stored server-side for one browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Tokens set after a successful code exchange
    pub tokens: Option<StravaTokens>,
    /// Strava athlete that owns the tokens
    pub athlete_id: Option<u64>,
    /// Expected OAuth `state` while a redirect is pending
    pub oauth_state: Option<String>,
    /// Secret from which CSRF tokens are derived
    pub csrf_secret: Option<String>,
}

impl SessionData {
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_some()
    }
}

/// Opaque session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh 256-bit session id.
    pub fn generate() -> Result<Self, SessionError> {
        let bytes: [u8; 32] = keys::random_bytes()?;
        Ok(Self(keys::encode(&bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A loaded (or freshly created) session, passed explicitly to handlers.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: SessionId,
    pub data: SessionData,
}

/// Session store errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Random number generation failed")]
    Rng,

    #[error("Key derivation failed")]
    KeyDerivation,

    #[error("Session backend error: {0}")]
    Backend(String),
}

/// Pluggable key-value backend for sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a live session. Expired sessions read as `None`.
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>, SessionError>;

    /// Insert or replace a session with the given time-to-live.
    async fn save(
        &self,
        id: &SessionId,
        data: &SessionData,
        ttl: Duration,
    ) -> Result<(), SessionError>;

    /// Remove a session. Removing an unknown id is not an error.
    async fn destroy(&self, id: &SessionId) -> Result<(), SessionError>;
}

/// Ties the session store to the signed session cookie and CSRF tokens.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    keys: SessionKeys,
    cookie_name: String,
    secure: bool,
    same_site: SameSite,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, config: &Config) -> Result<Self, SessionError> {
        Ok(Self {
            store,
            keys: SessionKeys::derive(&config.session_secret)?,
            cookie_name: config.session_name.clone(),
            secure: config.secure_cookies(),
            same_site: config.session_same_site,
        })
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    /// Load the session referenced by the request cookie, if any.
    ///
    /// A missing, tampered or expired cookie reads as no session.
    pub async fn load(&self, jar: &CookieJar) -> Result<Option<SessionContext>, SessionError> {
        let Some(id) = jar
            .get(&self.cookie_name)
            .and_then(|cookie| self.keys.verify_session_cookie(cookie.value()))
        else {
            return Ok(None);
        };

        Ok(self
            .store
            .load(&id)
            .await?
            .map(|data| SessionContext { id, data }))
    }

    /// Load the current session or start a new, unsaved one.
    pub async fn load_or_create(&self, jar: &CookieJar) -> Result<SessionContext, SessionError> {
        match self.load(jar).await? {
            Some(session) => Ok(session),
            None => Ok(SessionContext {
                id: SessionId::generate()?,
                data: SessionData::default(),
            }),
        }
    }

    /// Persist the session under its id.
    pub async fn save(&self, session: &SessionContext) -> Result<(), SessionError> {
        self.store.save(&session.id, &session.data, SESSION_TTL).await
    }

    pub async fn destroy(&self, id: &SessionId) -> Result<(), SessionError> {
        self.store.destroy(id).await
    }

    /// Cookie carrying the signed session id.
    pub fn session_cookie(&self, session: &SessionContext) -> Cookie<'static> {
        Cookie::build((
            self.cookie_name.clone(),
            self.keys.sign_session_id(&session.id),
        ))
        .path("/")
        .http_only(true)
        .secure(self.secure)
        .same_site(self.same_site)
        .max_age(time::Duration::seconds(SESSION_TTL.as_secs() as i64))
        .build()
    }

    /// Cookie with the same attributes as [`Self::session_cookie`], for removal.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), ""))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .build()
    }

    /// Issue a CSRF token, creating the per-session secret if needed.
    ///
    /// Returns whether the session changed and must be saved.
    pub fn issue_csrf_token(
        &self,
        session: &mut SessionContext,
    ) -> Result<(String, bool), SessionError> {
        let created = session.data.csrf_secret.is_none();
        if created {
            let secret: [u8; 18] = keys::random_bytes()?;
            session.data.csrf_secret = Some(keys::encode(&secret));
        }

        let secret = session.data.csrf_secret.as_deref().unwrap_or_default();
        Ok((self.keys.csrf_token(secret)?, created))
    }

    /// Check a client-supplied CSRF token against the session secret.
    pub fn verify_csrf_token(&self, session: &SessionContext, token: &str) -> bool {
        session
            .data
            .csrf_secret
            .as_deref()
            .is_some_and(|secret| self.keys.verify_csrf_token(secret, token))
    }
}
