// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity listing and lookup tests.
//!
//! These tests verify that:
//! 1. Pagination parameters are clamped before reaching Strava
//! 2. Activity IDs are validated
//! 3. Strava failures surface as 502 without upstream details

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{body_json, create_test_app, get, seed_authenticated_session, send};

fn activity_json(id: u64) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Lunch Run",
        "distance": 8046.7,
        "moving_time": 2460,
        "elapsed_time": 2555,
        "total_elevation_gain": 42.0,
        "type": "Run",
        "sport_type": "Run",
        "start_date": "2024-04-02T19:10:00Z",
        "start_date_local": "2024-04-02T12:10:00Z",
        "timezone": "(GMT-08:00) America/Los_Angeles",
        "average_speed": 3.27,
        "max_speed": 4.9,
        "average_heartrate": 151.2,
        "kudos_count": 4,
        "achievement_count": 1
    })
}

async fn expect_paging(server: &MockServer, page: &str, per_page: &str) {
    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .and(header("authorization", "Bearer access-valid"))
        .and(query_param("page", page))
        .and(query_param("per_page", per_page))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([activity_json(1)])))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_default_paging() {
    let (state, server) = create_test_app().await;
    expect_paging(&server, "1", "30").await;
    let cookie = seed_authenticated_session(&state).await;

    let response = send(&state, get("/api/activities", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body[0]["name"], "Lunch Run");
    assert_eq!(body[0]["type"], "Run");
}

#[tokio::test]
async fn test_page_zero_clamped_to_one() {
    let (state, server) = create_test_app().await;
    expect_paging(&server, "1", "10").await;
    let cookie = seed_authenticated_session(&state).await;

    let response = send(
        &state,
        get("/api/activities?page=0&per_page=10", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_per_page_clamped_to_maximum() {
    let (state, server) = create_test_app().await;
    expect_paging(&server, "3", "200").await;
    let cookie = seed_authenticated_session(&state).await;

    let response = send(
        &state,
        get("/api/activities?page=3&per_page=5000", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unparsable_paging_uses_defaults() {
    let (state, server) = create_test_app().await;
    expect_paging(&server, "1", "30").await;
    let cookie = seed_authenticated_session(&state).await;

    let response = send(
        &state,
        get("/api/activities?page=abc&per_page=-3", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_activity_detail() {
    let (state, server) = create_test_app().await;
    let mut detail = activity_json(987654321);
    detail["description"] = json!("Easy loop");
    detail["calories"] = json!(512.0);
    Mock::given(method("GET"))
        .and(path("/api/v3/activities/987654321"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail))
        .expect(1)
        .mount(&server)
        .await;
    let cookie = seed_authenticated_session(&state).await;

    let response = send(&state, get("/api/activities/987654321", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], 987654321u64);
    assert_eq!(body["description"], "Easy loop");
}

#[tokio::test]
async fn test_invalid_activity_id_rejected() {
    let (state, server) = create_test_app().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(activity_json(1)))
        .expect(0)
        .mount(&server)
        .await;
    let cookie = seed_authenticated_session(&state).await;

    for id in ["0", "-1", "abc"] {
        let uri = format!("/api/activities/{id}");
        let response = send(&state, get(&uri, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "id {id}");
        assert_eq!(body_json(response).await["error"], "bad_request");
    }
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let (state, server) = create_test_app().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;
    let cookie = seed_authenticated_session(&state).await;

    let response = send(&state, get("/api/activities", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_json(response).await;
    assert_eq!(body, json!({"error": "upstream_error"}));
}

#[tokio::test]
async fn test_upstream_shape_mismatch_is_bad_gateway() {
    let (state, server) = create_test_app().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"not": "a list"})))
        .mount(&server)
        .await;
    let cookie = seed_authenticated_session(&state).await;

    let response = send(&state, get("/api/activities", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
