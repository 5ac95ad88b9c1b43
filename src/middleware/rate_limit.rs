// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fixed-window rate limiting per client IP.
//!
//! Every limited response carries the standard `RateLimit-Limit`,
//! `RateLimit-Remaining` and `RateLimit-Reset` headers. Requests over the
//! limit get 429 with `Retry-After`.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Windows are swept once the map grows past this many clients.
const SWEEP_THRESHOLD: usize = 10_000;

/// Per-client request window.
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub is_limited: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the current window resets
    pub reset_after_secs: u64,
}

/// Fixed-window request counter keyed by client IP.
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    clients: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            clients: DashMap::new(),
        }
    }

    /// Count a request from `client` and report whether it is over the limit.
    pub fn check(&self, client: &str) -> RateLimitStatus {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> RateLimitStatus {
        if self.clients.len() > SWEEP_THRESHOLD {
            let window = self.window;
            self.clients
                .retain(|_, w| now.duration_since(w.started) < window);
        }

        let mut entry = self.clients.entry(client.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        entry.count = entry.count.saturating_add(1);
        let elapsed = now.duration_since(entry.started);
        let reset_after = self.window.saturating_sub(elapsed);

        RateLimitStatus {
            is_limited: entry.count > self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_after_secs: reset_after.as_secs_f64().ceil() as u64,
        }
    }
}

/// Middleware applying the shared [`RateLimiter`].
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(&request);
    let status = state.rate_limiter.check(&client);

    let mut response = if status.is_limited {
        tracing::warn!(client = %client, limit = status.limit, "Rate limit exceeded");
        let mut response = AppError::RateLimited.into_response();
        insert_header(
            response.headers_mut(),
            axum::http::header::RETRY_AFTER,
            status.reset_after_secs,
        );
        response
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    insert_header(
        headers,
        HeaderName::from_static("ratelimit-limit"),
        status.limit,
    );
    insert_header(
        headers,
        HeaderName::from_static("ratelimit-remaining"),
        status.remaining,
    );
    insert_header(
        headers,
        HeaderName::from_static("ratelimit-reset"),
        status.reset_after_secs,
    );

    response
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: impl ToString) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(name, value);
    }
}

/// Peer address when known, else the first `X-Forwarded-For` hop.
fn client_ip(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
