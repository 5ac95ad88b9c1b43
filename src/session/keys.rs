// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Keys and primitives for signed session cookies and CSRF tokens.
//!
//! Both keys are derived from `SESSION_SECRET` with HKDF-SHA256 so that a
//! cookie signature can never be replayed as a CSRF token or vice versa.

use super::{SessionError, SessionId};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

const HKDF_SALT: &[u8] = b"activity-calendar-bff";
const COOKIE_KEY_INFO: &[u8] = b"session-cookie-v1";
const CSRF_KEY_INFO: &[u8] = b"csrf-token-v1";

/// Fill an array with bytes from the system CSPRNG.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], SessionError> {
    let mut buf = [0u8; N];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| SessionError::Rng)?;
    Ok(buf)
}

/// URL-safe base64 without padding.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Derived signing keys, kept as keyed MACs ready to be cloned per use.
#[derive(Clone)]
pub struct SessionKeys {
    cookie_mac: HmacSha256,
    csrf_mac: HmacSha256,
}

impl SessionKeys {
    pub fn derive(secret: &[u8]) -> Result<Self, SessionError> {
        let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), secret);

        let mut cookie_key = [0u8; 32];
        hk.expand(COOKIE_KEY_INFO, &mut cookie_key)
            .map_err(|_| SessionError::KeyDerivation)?;
        let mut csrf_key = [0u8; 32];
        hk.expand(CSRF_KEY_INFO, &mut csrf_key)
            .map_err(|_| SessionError::KeyDerivation)?;

        Ok(Self {
            cookie_mac: HmacSha256::new_from_slice(&cookie_key)
                .map_err(|_| SessionError::KeyDerivation)?,
            csrf_mac: HmacSha256::new_from_slice(&csrf_key)
                .map_err(|_| SessionError::KeyDerivation)?,
        })
    }

    /// Cookie value: `id.signature`.
    pub fn sign_session_id(&self, id: &SessionId) -> String {
        let mut mac = self.cookie_mac.clone();
        mac.update(id.as_str().as_bytes());
        let signature = mac.finalize().into_bytes();
        format!("{}.{}", id.as_str(), encode(&signature))
    }

    /// Verify a cookie value and return the session id it carries.
    pub fn verify_session_cookie(&self, value: &str) -> Option<SessionId> {
        let (id, signature) = value.split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.cookie_mac.clone();
        mac.update(id.as_bytes());
        if mac.verify_slice(&signature).is_err() {
            tracing::warn!("Session cookie signature mismatch");
            return None;
        }

        Some(SessionId::from(id.to_string()))
    }

    /// Create a salted CSRF token bound to the session's CSRF secret.
    pub fn csrf_token(&self, secret: &str) -> Result<String, SessionError> {
        let salt: [u8; 8] = random_bytes()?;
        let salt = encode(&salt);
        let mut mac = self.csrf_mac.clone();
        mac.update(csrf_payload(&salt, secret).as_bytes());
        let digest = mac.finalize().into_bytes();
        Ok(format!("{}.{}", salt, encode(&digest)))
    }

    pub fn verify_csrf_token(&self, secret: &str, token: &str) -> bool {
        let Some((salt, digest)) = token.split_once('.') else {
            return false;
        };
        let Ok(digest) = URL_SAFE_NO_PAD.decode(digest) else {
            return false;
        };
        let mut mac = self.csrf_mac.clone();
        mac.update(csrf_payload(salt, secret).as_bytes());
        mac.verify_slice(&digest).is_ok()
    }
}

fn csrf_payload(salt: &str, secret: &str) -> String {
    format!("{}|{}", salt, secret)
}
