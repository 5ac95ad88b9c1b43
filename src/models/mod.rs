// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod calendar;
pub mod strava;

pub use calendar::{CalendarEvent, CalendarRef, EventRepetition, UserCalendar};
pub use strava::{ActivityDetail, ActivitySummary, Athlete};
