// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Every value is read and validated once at startup. A missing or invalid
//! variable aborts startup with a descriptive [`ConfigError`] instead of
//! running half-configured.

use axum_extra::extract::cookie::SameSite;
use reqwest::Url;
use std::env;
use std::time::Duration;

/// Minimum length of `SESSION_SECRET`.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_SESSION_NAME: &str = "strava_tracker_session";
const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 900_000;
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 100;
const DEFAULT_STRAVA_API_URL: &str = "https://www.strava.com/api/v3";
const DEFAULT_STRAVA_OAUTH_URL: &str = "https://www.strava.com/oauth";

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "development" => Some(Environment::Development),
            "production" => Some(Environment::Production),
            "test" => Some(Environment::Test),
            _ => None,
        }
    }
}

/// Where calendar records are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarBackend {
    Memory,
    Firestore { project_id: String },
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// Server port
    pub port: u16,

    // --- Strava OAuth ---
    pub strava_client_id: String,
    pub strava_client_secret: String,
    /// Callback URL registered with Strava
    pub strava_redirect_uri: String,
    /// Base URL of the Strava REST API
    pub strava_api_url: String,
    /// Base URL of the Strava OAuth endpoints (`/authorize`, `/token`)
    pub strava_oauth_url: String,

    // --- Sessions ---
    /// Secret from which the cookie and CSRF keys are derived
    pub session_secret: Vec<u8>,
    /// Session cookie name
    pub session_name: String,
    pub session_same_site: SameSite,

    // --- Frontend ---
    /// Frontend URL for OAuth redirects
    pub frontend_url: String,
    /// Origin of `frontend_url`, used for CORS
    pub cors_origin: String,

    // --- Rate limiting ---
    pub rate_limit_window: Duration,
    pub rate_limit_max_requests: u32,

    pub calendar_backend: CalendarBackend,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let environment = match get("APP_ENV") {
            Some(raw) => Environment::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "APP_ENV",
                reason: format!("unknown environment '{raw}'"),
            })?,
            None => Environment::Development,
        };

        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;

        let strava_redirect_uri = require("STRAVA_REDIRECT_URI")?;
        parse_url("STRAVA_REDIRECT_URI", &strava_redirect_uri)?;

        let session_secret = require("SESSION_SECRET")?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "SESSION_SECRET",
                reason: format!("must be at least {MIN_SESSION_SECRET_LEN} characters"),
            });
        }

        let frontend_url = require("FRONTEND_URL")?;
        let cors_origin = parse_url("FRONTEND_URL", &frontend_url)?
            .origin()
            .ascii_serialization();
        let frontend_url = frontend_url.trim_end_matches('/').to_string();

        // Production serves the frontend from another site, so the cookie
        // must travel on cross-site requests and is always `Secure` there.
        let session_same_site = match get("SESSION_SAME_SITE").as_deref() {
            None if environment == Environment::Production => SameSite::None,
            None | Some("lax") => SameSite::Lax,
            Some("strict") => SameSite::Strict,
            Some("none") => SameSite::None,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "SESSION_SAME_SITE",
                    reason: format!("expected lax, strict or none, got '{other}'"),
                })
            }
        };

        let rate_limit_window_ms = parse_or(
            "RATE_LIMIT_WINDOW_MS",
            get("RATE_LIMIT_WINDOW_MS"),
            DEFAULT_RATE_LIMIT_WINDOW_MS,
        )?;
        let rate_limit_max_requests = parse_or(
            "RATE_LIMIT_MAX_REQUESTS",
            get("RATE_LIMIT_MAX_REQUESTS"),
            DEFAULT_RATE_LIMIT_MAX_REQUESTS,
        )?;
        if rate_limit_window_ms == 0 || rate_limit_max_requests == 0 {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_WINDOW_MS",
                reason: "rate limit window and threshold must be positive".to_string(),
            });
        }

        let calendar_backend = match get("CALENDAR_BACKEND").as_deref() {
            None | Some("memory") => CalendarBackend::Memory,
            Some("firestore") => CalendarBackend::Firestore {
                project_id: require("GCP_PROJECT_ID")?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "CALENDAR_BACKEND",
                    reason: format!("expected memory or firestore, got '{other}'"),
                })
            }
        };

        let strava_api_url = get("STRAVA_API_URL")
            .unwrap_or_else(|| DEFAULT_STRAVA_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        parse_url("STRAVA_API_URL", &strava_api_url)?;
        let strava_oauth_url = get("STRAVA_OAUTH_URL")
            .unwrap_or_else(|| DEFAULT_STRAVA_OAUTH_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        parse_url("STRAVA_OAUTH_URL", &strava_oauth_url)?;

        Ok(Self {
            environment,
            port,
            strava_client_id: require("STRAVA_CLIENT_ID")?,
            strava_client_secret: require("STRAVA_CLIENT_SECRET")?,
            strava_redirect_uri,
            strava_api_url,
            strava_oauth_url,
            session_secret: session_secret.into_bytes(),
            session_name: get("SESSION_NAME").unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string()),
            session_same_site,
            frontend_url,
            cors_origin,
            rate_limit_window: Duration::from_millis(rate_limit_window_ms),
            rate_limit_max_requests,
            calendar_backend,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Test,
            port: DEFAULT_PORT,
            strava_client_id: "test_client_id".to_string(),
            strava_client_secret: "test_secret".to_string(),
            strava_redirect_uri: "http://localhost:3001/auth/strava/callback".to_string(),
            strava_api_url: DEFAULT_STRAVA_API_URL.to_string(),
            strava_oauth_url: DEFAULT_STRAVA_OAUTH_URL.to_string(),
            session_secret: b"test_session_secret_32_bytes_minimum!!".to_vec(),
            session_name: DEFAULT_SESSION_NAME.to_string(),
            session_same_site: SameSite::Lax,
            frontend_url: "http://localhost:5173".to_string(),
            cors_origin: "http://localhost:5173".to_string(),
            rate_limit_window: Duration::from_millis(DEFAULT_RATE_LIMIT_WINDOW_MS),
            rate_limit_max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            calendar_backend: CalendarBackend::Memory,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Whether cookies must carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.is_production() || self.session_same_site == SameSite::None
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            key,
            reason: format!("'{raw}' is not a valid number"),
        }),
    }
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::Invalid {
        key,
        reason: format!("must be a valid URL ({e})"),
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid environment variable {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("STRAVA_CLIENT_ID", "test_id"),
            ("STRAVA_CLIENT_SECRET", "test_secret"),
            (
                "STRAVA_REDIRECT_URI",
                "http://localhost:3001/auth/strava/callback",
            ),
            ("SESSION_SECRET", "0123456789abcdef0123456789abcdef"),
            ("FRONTEND_URL", "http://localhost:5173/app/"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_config_from_lookup_defaults() {
        let config = load(&base_env()).expect("Config should load");

        assert_eq!(config.strava_client_id, "test_id");
        assert_eq!(config.strava_client_secret, "test_secret");
        assert_eq!(config.port, 3001);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.session_name, "strava_tracker_session");
        assert_eq!(config.cors_origin, "http://localhost:5173");
        assert_eq!(config.frontend_url, "http://localhost:5173/app");
        assert_eq!(config.rate_limit_window, Duration::from_secs(900));
        assert_eq!(config.rate_limit_max_requests, 100);
        assert_eq!(config.calendar_backend, CalendarBackend::Memory);
        assert!(!config.secure_cookies());
    }

    #[test]
    fn test_missing_client_id_is_reported() {
        let mut vars = base_env();
        vars.remove("STRAVA_CLIENT_ID");

        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("STRAVA_CLIENT_ID")));
    }

    #[test]
    fn test_short_session_secret_rejected() {
        let mut vars = base_env();
        vars.insert("SESSION_SECRET", "too-short");

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("SESSION_SECRET"));
    }

    #[test]
    fn test_invalid_frontend_url_rejected() {
        let mut vars = base_env();
        vars.insert("FRONTEND_URL", "not a url");

        let err = load(&vars).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "FRONTEND_URL",
                ..
            }
        ));
    }

    #[test]
    fn test_firestore_backend_requires_project() {
        let mut vars = base_env();
        vars.insert("CALENDAR_BACKEND", "firestore");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Missing("GCP_PROJECT_ID")
        ));

        vars.insert("GCP_PROJECT_ID", "demo-project");
        let config = load(&vars).unwrap();
        assert_eq!(
            config.calendar_backend,
            CalendarBackend::Firestore {
                project_id: "demo-project".to_string()
            }
        );
    }

    #[test]
    fn test_production_uses_secure_cookies() {
        let mut vars = base_env();
        vars.insert("APP_ENV", "production");
        let config = load(&vars).unwrap();
        assert!(config.is_production());
        assert!(config.secure_cookies());
        assert_eq!(config.session_same_site, SameSite::None);
    }

    #[test]
    fn test_same_site_default_follows_environment() {
        let mut vars = base_env();
        assert_eq!(load(&vars).unwrap().session_same_site, SameSite::Lax);

        vars.insert("APP_ENV", "production");
        vars.insert("SESSION_SAME_SITE", "strict");
        let config = load(&vars).unwrap();
        assert_eq!(config.session_same_site, SameSite::Strict);
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_invalid_rate_limit_rejected() {
        let mut vars = base_env();
        vars.insert("RATE_LIMIT_MAX_REQUESTS", "lots");
        assert!(load(&vars).is_err());
    }
}
