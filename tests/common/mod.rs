// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use activity_calendar_bff::config::Config;
use activity_calendar_bff::db::FirestoreDb;
use activity_calendar_bff::routes::create_router;
use activity_calendar_bff::session::{SessionContext, SessionData, StravaTokens};
use activity_calendar_bff::AppState;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Connect to the Firestore emulator.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Athlete used by seeded sessions.
#[allow(dead_code)]
pub const ATHLETE_ID: u64 = 134815;

/// Test config with Strava pointed at the mock server.
#[allow(dead_code)]
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::test_default();
    config.strava_api_url = format!("{}/api/v3", server.uri());
    config.strava_oauth_url = format!("{}/oauth", server.uri());
    config
}

/// Create test state backed by in-memory stores and a fresh mock Strava.
#[allow(dead_code)]
pub async fn create_test_app() -> (Arc<AppState>, MockServer) {
    let server = MockServer::start().await;
    let state = create_test_app_with_config(test_config(&server));
    (state, server)
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> Arc<AppState> {
    Arc::new(AppState::in_memory(config).expect("Failed to build test state"))
}

/// Send one request through a freshly built router.
#[allow(dead_code)]
pub async fn send(state: &Arc<AppState>, request: Request<Body>) -> Response {
    create_router(state.clone()).oneshot(request).await.unwrap()
}

#[allow(dead_code)]
pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub fn json_request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    csrf: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if let Some(csrf) = csrf {
        builder = builder.header("X-CSRF-Token", csrf);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Tokens that stay valid for the rest of the test run.
#[allow(dead_code)]
pub fn valid_tokens() -> StravaTokens {
    StravaTokens {
        access_token: "access-valid".to_string(),
        refresh_token: "refresh-valid".to_string(),
        expires_at: chrono::Utc::now().timestamp() + 6 * 3600,
    }
}

/// Session for [`ATHLETE_ID`] whose access token has just expired.
#[allow(dead_code)]
pub fn expired_session() -> SessionData {
    SessionData {
        tokens: Some(StravaTokens {
            access_token: "access-old".to_string(),
            refresh_token: "refresh-old".to_string(),
            expires_at: chrono::Utc::now().timestamp() - 1,
        }),
        athlete_id: Some(ATHLETE_ID),
        ..SessionData::default()
    }
}

/// Refresh response granting a new token triple.
#[allow(dead_code)]
pub async fn mount_refresh(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "access_token": "access-new",
            "refresh_token": "refresh-new",
            "expires_at": 1_900_000_000,
            "expires_in": 21600
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Persist a session and return its `Cookie` header value.
#[allow(dead_code)]
pub async fn seed_session(state: &Arc<AppState>, data: SessionData) -> String {
    let mut session = state
        .sessions
        .load_or_create(&CookieJar::new())
        .await
        .unwrap();
    session.data = data;
    state.sessions.save(&session).await.unwrap();

    let cookie = state.sessions.session_cookie(&session);
    format!("{}={}", cookie.name(), cookie.value())
}

/// Session holding valid tokens for [`ATHLETE_ID`].
#[allow(dead_code)]
pub async fn seed_authenticated_session(state: &Arc<AppState>) -> String {
    seed_session(
        state,
        SessionData {
            tokens: Some(valid_tokens()),
            athlete_id: Some(ATHLETE_ID),
            ..SessionData::default()
        },
    )
    .await
}

/// Load the session a `Cookie` header value refers to.
#[allow(dead_code)]
pub async fn load_session(state: &Arc<AppState>, cookie: &str) -> Option<SessionContext> {
    let (name, value) = cookie.split_once('=').unwrap();
    let jar = CookieJar::new().add(Cookie::new(name.to_string(), value.to_string()));
    state.sessions.load(&jar).await.unwrap()
}

/// Fetch a CSRF token for the session.
#[allow(dead_code)]
pub async fn fetch_csrf_token(state: &Arc<AppState>, cookie: &str) -> String {
    let response = send(state, get("/auth/csrf-token", Some(cookie))).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await["csrfToken"]
        .as_str()
        .unwrap()
        .to_string()
}

/// All `Set-Cookie` header values.
#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// The `name=value` pair of the named cookie from `Set-Cookie`.
#[allow(dead_code)]
pub fn find_cookie(response: &Response, name: &str) -> Option<String> {
    set_cookie_headers(response)
        .into_iter()
        .find(|value| value.starts_with(&format!("{name}=")))
}

#[allow(dead_code)]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
        .to_string()
}
