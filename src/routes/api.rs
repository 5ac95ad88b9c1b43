// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users, proxied to Strava.

use crate::error::{AppError, Result};
use crate::middleware::AuthSession;
use crate::models::{ActivityDetail, ActivitySummary, Athlete};
use crate::services::strava::clamp_paging;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// API routes (require an authenticated session).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/athlete", get(get_athlete))
        .route("/api/activities", get(get_activities))
        .route("/api/activities/{id}", get(get_activity))
}

/// Get the authenticated athlete's profile.
async fn get_athlete(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
) -> Result<Json<Athlete>> {
    let athlete = state.strava.get_athlete(&auth.access_token).await?;
    Ok(Json(athlete))
}

// ─── Activities ──────────────────────────────────────────────

/// Query parameters for listing activities.
///
/// Kept as raw strings so a malformed value falls back to the default
/// instead of rejecting the request.
#[derive(Debug, Deserialize)]
pub struct ActivitiesParams {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub per_page: Option<String>,
}

/// List the athlete's activities.
async fn get_activities(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    Query(params): Query<ActivitiesParams>,
) -> Result<Json<Vec<ActivitySummary>>> {
    let (page, per_page) = clamp_paging(params.page.as_deref(), params.per_page.as_deref());

    let activities = state
        .strava
        .list_activities(&auth.access_token, page, per_page)
        .await?;

    tracing::debug!(
        athlete_id = ?auth.athlete_id,
        page,
        per_page,
        count = activities.len(),
        "Fetched activities"
    );

    Ok(Json(activities))
}

/// Get one activity in detail.
async fn get_activity(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    Path(id): Path<String>,
) -> Result<Json<ActivityDetail>> {
    let activity_id = parse_activity_id(&id)
        .ok_or_else(|| AppError::BadRequest("Invalid activity ID".to_string()))?;

    let activity = state
        .strava
        .get_activity(&auth.access_token, activity_id)
        .await?;
    Ok(Json(activity))
}

/// Activity IDs are positive integers.
fn parse_activity_id(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_activity_id() {
        assert_eq!(parse_activity_id("12345"), Some(12345));
        assert_eq!(parse_activity_id("0"), None);
        assert_eq!(parse_activity_id("-5"), None);
        assert_eq!(parse_activity_id("abc"), None);
        assert_eq!(parse_activity_id(""), None);
    }
}
