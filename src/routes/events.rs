// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar event persistence routes.
//!
//! Responses wrap the record as `{"task": ...}`, the envelope the web client
//! already reads.

use crate::error::{AppError, Result};
use crate::middleware::AuthSession;
use crate::models::calendar::MAX_EVENTS;
use crate::models::{CalendarEvent, UserCalendar};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Event routes (require an authenticated session and, for writes, CSRF).
/// Both middlewares are applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/event/events", post(create_calendar))
        .route("/event/events/{user_id}", get(get_events).put(update_events))
}

#[derive(Debug, Serialize)]
pub struct CalendarEnvelope {
    pub task: UserCalendar,
}

#[derive(Debug, Deserialize)]
pub struct CreateCalendarRequest {
    #[serde(rename = "UserID")]
    pub user_id: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEventsRequest {
    #[validate(length(max = MAX_EVENTS), nested)]
    pub events: Vec<CalendarEvent>,
}

/// Only the athlete that owns the session may touch its calendar.
fn ensure_owner(auth: &AuthSession, user_id: u64) -> Result<()> {
    if auth.athlete_id == Some(user_id) {
        return Ok(());
    }
    tracing::warn!(
        athlete_id = ?auth.athlete_id,
        user_id,
        "Calendar access for another user denied"
    );
    Err(AppError::Forbidden(
        "Calendar belongs to another user".to_string(),
    ))
}

/// Create an empty calendar record unless one already exists.
async fn create_calendar(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    WithRejection(Json(request), _): WithRejection<Json<CreateCalendarRequest>, AppError>,
) -> Result<(StatusCode, Json<CalendarEnvelope>)> {
    ensure_owner(&auth, request.user_id)?;

    let (record, created) = state.calendars.create_if_absent(request.user_id).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(CalendarEnvelope { task: record })))
}

async fn get_events(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    Path(user_id): Path<u64>,
) -> Result<Json<CalendarEnvelope>> {
    ensure_owner(&auth, user_id)?;

    let record = state
        .calendars
        .get(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Calendar for user {} not found", user_id)))?;

    Ok(Json(CalendarEnvelope { task: record }))
}

/// Replace the stored events with the submitted sequence.
async fn update_events(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    Path(user_id): Path<u64>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateEventsRequest>, AppError>,
) -> Result<Json<CalendarEnvelope>> {
    ensure_owner(&auth, user_id)?;
    request.validate()?;

    let events: Vec<CalendarEvent> = request
        .events
        .into_iter()
        .map(CalendarEvent::with_default_end)
        .collect();
    let count = events.len();

    let record = state
        .calendars
        .replace_events(user_id, events)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Calendar for user {} not found", user_id)))?;

    tracing::info!(user_id, events_count = count, "Calendar updated");
    Ok(Json(CalendarEnvelope { task: record }))
}
