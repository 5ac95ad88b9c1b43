// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client.
//!
//! Handles:
//! - Building the OAuth authorization URL
//! - Authorization code exchange and token refresh
//! - Athlete and activity reads on behalf of a bearer token
//!
//! The client is stateless: every resource call takes the access token
//! explicitly. Any failure (timeout, transport, non-2xx, unexpected body) is
//! reported as [`AppError::StravaApi`] with the detail logged here.

use crate::config::Config;
use crate::error::AppError;
use crate::models::{ActivityDetail, ActivitySummary, Athlete};
use crate::session::StravaTokens;
use serde::Deserialize;
use std::time::Duration;

/// Timeout applied to every Strava request.
pub const STRAVA_TIMEOUT: Duration = Duration::from_secs(10);

/// OAuth scopes requested at authorization.
pub const STRAVA_SCOPES: &str = "read,activity:read_all,activity:write";

/// Default and maximum page sizes for activity listing.
pub const DEFAULT_PER_PAGE: u32 = 30;
pub const MAX_PER_PAGE: u32 = 200;

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    api_url: String,
    oauth_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl StravaClient {
    /// Create a new Strava client from the configured credentials and URLs.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(STRAVA_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            api_url: config.strava_api_url.clone(),
            oauth_url: config.strava_oauth_url.clone(),
            client_id: config.strava_client_id.clone(),
            client_secret: config.strava_client_secret.clone(),
            redirect_uri: config.strava_redirect_uri.clone(),
        })
    }

    /// Authorization endpoint URL carrying the anti-forgery `state` nonce.
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}/authorize?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             approval_prompt=auto&\
             scope={}&\
             state={}",
            self.oauth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(STRAVA_SCOPES),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for a token triple.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token exchange request failed: {}", e)))?;

        let tokens: TokenResponse = self.check_response_json(response).await?;
        tokens.check()?;
        Ok(tokens)
    }

    /// Refresh an expired access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token refresh request failed: {}", e)))?;

        let tokens: TokenResponse = self.check_response_json(response).await?;
        tokens.check()?;
        Ok(tokens)
    }

    /// Get authenticated athlete profile.
    pub async fn get_athlete(&self, access_token: &str) -> Result<Athlete, AppError> {
        let url = format!("{}/athlete", self.api_url);
        self.get_json(&url, access_token, &[]).await
    }

    /// List the athlete's activities, newest first.
    pub async fn list_activities(
        &self,
        access_token: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<ActivitySummary>, AppError> {
        let url = format!("{}/athlete/activities", self.api_url);
        self.get_json(
            &url,
            access_token,
            &[
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ],
        )
        .await
    }

    /// Get a detailed activity by ID.
    pub async fn get_activity(
        &self,
        access_token: &str,
        activity_id: u64,
    ) -> Result<ActivityDetail, AppError> {
        let url = format!("{}/activities/{}", self.api_url, activity_id);
        self.get_json(&url, access_token, &[]).await
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Strava rate limit hit (429)");
            } else {
                tracing::error!(status = status.as_u16(), body = %body, "Strava request failed");
            }

            return Err(AppError::StravaApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))
    }
}

/// Normalize `page`/`per_page` query values for [`StravaClient::list_activities`].
///
/// Missing or unparsable values fall back to the defaults; `per_page` is
/// clamped to `1..=200` and `page` to at least 1.
pub fn clamp_paging(page: Option<&str>, per_page: Option<&str>) -> (u32, u32) {
    let page = page
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .max(1);
    let per_page = per_page
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    (page, per_page)
}

/// Token response from Strava (`POST /oauth/token`).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    /// Present on code exchange, absent on refresh
    #[serde(default)]
    pub athlete: Option<TokenAthlete>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenAthlete {
    pub id: u64,
}

impl TokenResponse {
    fn check(&self) -> Result<(), AppError> {
        if self.access_token.is_empty() || self.refresh_token.is_empty() {
            return Err(AppError::StravaApi(
                "Token response carried an empty token".to_string(),
            ));
        }
        Ok(())
    }

    /// The token triple, replaced as a unit.
    pub fn tokens(&self) -> StravaTokens {
        StravaTokens {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: self.expires_at,
        }
    }
}
