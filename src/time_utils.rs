// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Default length of a newly scheduled event.
pub const DEFAULT_EVENT_MINUTES: i64 = 15;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The scheduler hands us a start time; the default end is 15 minutes later.
pub fn add_fifteen_minutes(date: DateTime<Utc>) -> DateTime<Utc> {
    date + Duration::minutes(DEFAULT_EVENT_MINUTES)
}

/// Current time as Unix seconds.
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}
