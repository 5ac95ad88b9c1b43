// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, CSRF, rate limiting, security headers).

pub mod auth;
pub mod csrf;
pub mod rate_limit;
pub mod security;

pub use auth::{require_auth, AuthSession};
pub use csrf::{require_csrf, require_csrf_if_authenticated};
pub use rate_limit::{rate_limit, RateLimiter};
