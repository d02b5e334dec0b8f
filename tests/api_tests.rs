//! HTTP-level tests driving the full router over an in-memory store.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use progress_engine::api::build_app;
use progress_engine::app_state::AppState;
use progress_engine::persistence::{MemorySeed, MemoryStore};
use progress_engine::service::ProgressService;

async fn app() -> Router {
    let seed: MemorySeed = match serde_json::from_value(json!({
        "students": ["ana", "leo"],
        "games": [
            { "game_id": "sums", "levels": [2, 2] },
            { "game_id": "halves", "levels": [4] }
        ],
        "courses": [{
            "course_id": "4b",
            "students": ["ana", "leo"],
            "games": [
                { "game_id": "sums", "enabled": true },
                { "game_id": "halves", "enabled": false }
            ]
        }]
    })) {
        Ok(seed) => seed,
        Err(e) => panic!("seed: {e}"),
    };
    let store = Arc::new(MemoryStore::from_seed(seed).await);
    let service = ProgressService::from_store(store);
    build_app(AppState::new(service), Duration::from_secs(5))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let Ok(response) = app.clone().oneshot(request).await;
    let status = response.status();
    let bytes = match response.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => panic!("body: {e}"),
    };
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(e) => panic!("json: {e}"),
        }
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    match Request::get(uri).body(Body::empty()) {
        Ok(r) => r,
        Err(e) => panic!("request: {e}"),
    }
}

fn post_completion(body: &Value) -> Request<Body> {
    match Request::post("/api/v1/activity-completions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
    {
        Ok(r) => r,
        Err(e) => panic!("request: {e}"),
    }
}

fn attempt(student: &str, level: u32, activity: u32, points: u32) -> Value {
    json!({
        "student_id": student,
        "game_id": "sums",
        "level": level,
        "activity": activity,
        "points": points,
        "attempts": 1,
        "is_completed": true,
        "correct_answers": 4,
        "total_questions": 5
    })
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = app().await;
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.pointer("/status"), Some(&json!("healthy")));
    assert_eq!(body.pointer("/storage_reachable"), Some(&json!(true)));
}

#[tokio::test]
async fn unknown_student_is_404_with_code() {
    let app = app().await;
    let (status, body) = send(&app, get("/api/v1/students/zoe/progress")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.pointer("/error/code"), Some(&json!(2001)));
}

#[tokio::test]
async fn unknown_game_and_course_are_404() {
    let app = app().await;
    let (status, body) = send(&app, get("/api/v1/games/chess/statistics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.pointer("/error/code"), Some(&json!(2002)));

    let (status, body) = send(&app, get("/api/v1/courses/9z/progress")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.pointer("/error/code"), Some(&json!(2003)));
}

#[tokio::test]
async fn invalid_attempt_is_400() {
    let app = app().await;
    let (status, body) = send(&app, post_completion(&attempt("ana", 0, 1, 10))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.pointer("/error/code"), Some(&json!(1001)));

    // "sums" has two levels of two activities each
    for (level, activity) in [(3, 1), (1, 3)] {
        let (status, body) =
            send(&app, post_completion(&attempt("ana", level, activity, 10))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.pointer("/error/code"), Some(&json!(1001)));
    }
}

#[tokio::test]
async fn recording_completions_unlocks_the_next_level() {
    let app = app().await;

    let (status, body) = send(&app, post_completion(&attempt("ana", 1, 1, 10))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.pointer("/record/total_points"), Some(&json!(10)));
    assert_eq!(body.pointer("/progress/percentage"), Some(&json!(25)));
    assert_eq!(body.pointer("/progress/max_unlocked_level"), Some(&json!(1)));

    let (status, body) = send(&app, post_completion(&attempt("ana", 1, 2, 15))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.pointer("/record/total_points"), Some(&json!(25)));
    assert_eq!(body.pointer("/progress/percentage"), Some(&json!(50)));
    assert_eq!(body.pointer("/progress/max_unlocked_level"), Some(&json!(2)));

    let (status, body) = send(&app, get("/api/v1/students/ana/games/sums/progress")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.pointer("/percentage"), Some(&json!(50)));
    assert_eq!(body.pointer("/max_unlocked_level"), Some(&json!(2)));
}

#[tokio::test]
async fn student_progress_without_records_is_zero() {
    let app = app().await;
    let (status, body) = send(&app, get("/api/v1/students/leo/progress?game_id=sums")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.pointer("/games/0/progress_percentage"), Some(&json!(0)));
    assert_eq!(body.pointer("/games/0/max_unlocked_level"), Some(&json!(1)));
    assert_eq!(body.pointer("/games/0/total_points"), Some(&json!(0)));
}

#[tokio::test]
async fn course_progress_lists_enabled_games_only() {
    let app = app().await;
    send(&app, post_completion(&attempt("ana", 1, 1, 10))).await;
    send(&app, post_completion(&attempt("ana", 1, 2, 10))).await;

    let (status, body) = send(&app, get("/api/v1/courses/4b/progress")).await;
    assert_eq!(status, StatusCode::OK);
    let Some(games) = body.pointer("/games").and_then(Value::as_array) else {
        panic!("games missing: {body}");
    };
    assert_eq!(games.len(), 1);
    // ana 50%, leo 0% -> 25
    assert_eq!(body.pointer("/games/0/game_id"), Some(&json!("sums")));
    assert_eq!(body.pointer("/games/0/average_progress"), Some(&json!(25)));
    assert_eq!(body.pointer("/games/0/total_students"), Some(&json!(2)));
    assert_eq!(body.pointer("/games/0/students_with_progress"), Some(&json!(1)));

    let (status, body) = send(&app, get("/api/v1/courses/4b/students/progress")).await;
    assert_eq!(status, StatusCode::OK);
    let Some(students) = body.pointer("/students").and_then(Value::as_array) else {
        panic!("students missing: {body}");
    };
    assert_eq!(students.len(), 2);
}

#[tokio::test]
async fn game_statistics_summarise_every_player() {
    let app = app().await;
    send(&app, post_completion(&attempt("ana", 1, 1, 10))).await;
    send(&app, post_completion(&attempt("ana", 1, 2, 20))).await;
    send(&app, post_completion(&attempt("leo", 1, 1, 6))).await;

    let (status, body) = send(&app, get("/api/v1/games/sums/statistics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.pointer("/game_id"), Some(&json!("sums")));
    assert_eq!(body.pointer("/total_students"), Some(&json!(2)));
    assert_eq!(body.pointer("/completion_rate"), Some(&json!(100.0)));
    // every attempt answered 4 of 5
    assert_eq!(body.pointer("/average_accuracy"), Some(&json!(80.0)));
    // mean of the per-student cumulative maxima: (30 + 6) / 2
    assert_eq!(body.pointer("/average_points"), Some(&json!(18.0)));
}

#[tokio::test]
async fn student_statistics_aggregate_across_games() {
    let app = app().await;
    send(&app, post_completion(&attempt("ana", 1, 1, 10))).await;

    let (status, body) = send(&app, get("/api/v1/students/ana/statistics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.pointer("/statistics/total_games_played"), Some(&json!(1)));
    assert_eq!(
        body.pointer("/statistics/progress_by_game/sums/completed"),
        Some(&json!(1))
    );
}
