// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity Calendar BFF: Strava sign-in and calendar storage for the web app
//!
//! This crate keeps Strava OAuth tokens in server-side sessions, proxies
//! athlete and activity reads to Strava, and stores each athlete's
//! scheduler events.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod time_utils;

use config::Config;
use db::{CalendarStore, MemoryCalendarStore};
use error::AppError;
use middleware::RateLimiter;
use services::StravaClient;
use session::{MemorySessionStore, SessionManager, SessionStore};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub sessions: SessionManager,
    pub calendars: Arc<dyn CalendarStore>,
    pub strava: StravaClient,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Assemble state around the given session and calendar backends.
    pub fn new(
        config: Config,
        sessions: Arc<dyn SessionStore>,
        calendars: Arc<dyn CalendarStore>,
    ) -> Result<Self, AppError> {
        let sessions = SessionManager::new(sessions, &config)?;
        let strava = StravaClient::new(&config)?;
        let rate_limiter =
            RateLimiter::new(config.rate_limit_window, config.rate_limit_max_requests);

        Ok(Self {
            config,
            sessions,
            calendars,
            strava,
            rate_limiter,
        })
    }

    /// State with every store kept in memory.
    pub fn in_memory(config: Config) -> Result<Self, AppError> {
        Self::new(
            config,
            Arc::new(MemorySessionStore::default()),
            Arc::new(MemoryCalendarStore::default()),
        )
    }
}
