// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar persistence.
//!
//! Records are keyed by Strava athlete ID. Two backends implement
//! [`CalendarStore`]: an in-process map and Firestore.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryCalendarStore;

use crate::error::AppError;
use crate::models::{CalendarEvent, UserCalendar};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// Calendar records (keyed by athlete_id)
    pub const USER_CALENDARS: &str = "user_calendars";
}

/// Backend for per-user calendar records.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Create an empty record for `user_id` unless one exists.
    ///
    /// Returns the stored record and whether it was created by this call.
    async fn create_if_absent(&self, user_id: u64) -> Result<(UserCalendar, bool), AppError>;

    async fn get(&self, user_id: u64) -> Result<Option<UserCalendar>, AppError>;

    /// Replace the whole event sequence. Returns `None` when no record exists.
    async fn replace_events(
        &self,
        user_id: u64,
        events: Vec<CalendarEvent>,
    ) -> Result<Option<UserCalendar>, AppError>;
}

/// A fresh record with no events.
pub(crate) fn empty_calendar(user_id: u64) -> UserCalendar {
    let now = crate::time_utils::format_utc_rfc3339(chrono::Utc::now());
    UserCalendar {
        user_id,
        events: Vec::new(),
        created_at: now.clone(),
        updated_at: now,
    }
}
