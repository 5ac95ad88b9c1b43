// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod api;
pub mod auth;
pub mod events;

use crate::error::AppError;
use crate::middleware::{rate_limit, require_auth, require_csrf};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, Method};
use axum::response::{IntoResponse, Response};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Largest accepted request body.
pub const BODY_LIMIT_BYTES: usize = 100 * 1024;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub environment: String,
}

/// Health check response
async fn health_check(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: format_utc_rfc3339(chrono::Utc::now()),
        environment: state.config.environment.as_str().to_string(),
    })
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

fn handle_panic(_panic: Box<dyn Any + Send + 'static>) -> Response {
    AppError::Internal(anyhow::anyhow!("Request handler panicked")).into_response()
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow the frontend origin, plus localhost in development
    let frontend_origin = state.config.cors_origin.clone();
    let allow_localhost = !state.config.is_production();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_origin
                    || (allow_localhost
                        && (origin_str.starts_with("http://localhost")
                            || origin_str.starts_with("http://127.0.0.1")))
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(crate::middleware::csrf::CSRF_HEADER),
            HeaderName::from_static(crate::middleware::csrf::XSRF_HEADER),
        ]);

    let rate_limited = middleware::from_fn_with_state(state.clone(), rate_limit);

    // Auth routes (session handled per route)
    let auth_routes = auth::routes(&state).route_layer(rate_limited.clone());

    // Strava proxy routes (session + token refresh required)
    let api_routes = api::routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .route_layer(rate_limited);

    // Calendar routes (CSRF on writes, checked before any token refresh)
    let event_routes = events::routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_csrf));

    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes)
        .merge(api_routes)
        .merge(event_routes)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
