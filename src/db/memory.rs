// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory calendar store, used for local development and tests.

use super::{empty_calendar, CalendarStore};
use crate::error::AppError;
use crate::models::{CalendarEvent, UserCalendar};
use crate::time_utils::format_utc_rfc3339;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryCalendarStore {
    calendars: DashMap<u64, UserCalendar>,
}

#[async_trait]
impl CalendarStore for MemoryCalendarStore {
    async fn create_if_absent(&self, user_id: u64) -> Result<(UserCalendar, bool), AppError> {
        match self.calendars.entry(user_id) {
            Entry::Occupied(existing) => Ok((existing.get().clone(), false)),
            Entry::Vacant(slot) => {
                let record = slot.insert(empty_calendar(user_id));
                Ok((record.value().clone(), true))
            }
        }
    }

    async fn get(&self, user_id: u64) -> Result<Option<UserCalendar>, AppError> {
        Ok(self.calendars.get(&user_id).map(|record| record.value().clone()))
    }

    async fn replace_events(
        &self,
        user_id: u64,
        events: Vec<CalendarEvent>,
    ) -> Result<Option<UserCalendar>, AppError> {
        Ok(self.calendars.get_mut(&user_id).map(|mut record| {
            record.events = events;
            record.updated_at = format_utc_rfc3339(chrono::Utc::now());
            record.value().clone()
        }))
    }
}
