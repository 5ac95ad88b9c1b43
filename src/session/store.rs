// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory session store.

use super::{SessionData, SessionError, SessionId, SessionStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Expired entries are swept once every this many saves.
const SWEEP_INTERVAL: usize = 1024;

/// Stored session with its expiry.
#[derive(Clone)]
struct Entry {
    data: SessionData,
    expires_at: Instant,
}

/// Session store backed by a concurrent in-process map.
///
/// Sessions do not survive a restart and are not shared between instances.
/// Expired entries are dropped lazily when they are read, and swept
/// periodically on save.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, Entry>,
    saves: AtomicUsize,
}

impl MemorySessionStore {
    /// Number of stored (possibly expired) sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn sweep_expired(&self, now: Instant) {
        self.sessions.retain(|_, entry| entry.expires_at > now);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>, SessionError> {
        let now = Instant::now();
        let data = match self.sessions.get(id.as_str()) {
            Some(entry) if entry.expires_at > now => Some(entry.data.clone()),
            Some(_) => None,
            None => return Ok(None),
        };

        if data.is_none() {
            self.sessions
                .remove_if(id.as_str(), |_, entry| entry.expires_at <= now);
        }
        Ok(data)
    }

    async fn save(
        &self,
        id: &SessionId,
        data: &SessionData,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| SessionError::Backend("session TTL overflow".to_string()))?;

        self.sessions.insert(
            id.as_str().to_string(),
            Entry {
                data: data.clone(),
                expires_at,
            },
        );
        if self.saves.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            self.sweep_expired(now);
        }
        Ok(())
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), SessionError> {
        self.sessions.remove(id.as_str());
        Ok(())
    }
}
