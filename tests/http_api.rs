//! `HttpApi` against a local axum server speaking the session API.

use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde_json::{Value, json};
use swarm::api::{FetchError, HttpApi, SessionApi};

async fn session(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    match id.as_str() {
        "42" => Ok(Json(json!({ "question_id": 7 }))),
        "43" => Ok(Json(json!({ "question_id": null }))),
        "44" => Ok(Json(json!({ "question_id": [1] }))),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn question(Path(id): Path<String>) -> Json<Value> {
    Json(json!({ "id": id.parse::<u64>().unwrap_or(0), "prompt": "Pick one", "answers": ["a", "b", "c"] }))
}

async fn join(Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    let user = body["user"].as_str().unwrap_or_default().to_owned();
    Json(json!({ "username": user, "id": format!("{id}-1") }))
}

async fn serve() -> String {
    let app = Router::new()
        .route("/api/session/{id}", get(session))
        .route("/api/session/{id}/participants", post(join))
        .route("/api/question/{id}", get(question));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn client() -> HttpApi {
    HttpApi::new(&serve().await, Some(Duration::from_secs(5))).unwrap()
}

#[tokio::test]
async fn fetch_session_normalizes_numeric_question_id() {
    let api = client().await;
    let info = api.fetch_session("42").await.unwrap();
    assert_eq!(info.question_id.as_deref(), Some("7"));
}

#[tokio::test]
async fn fetch_session_without_question() {
    let api = client().await;
    assert_eq!(api.fetch_session("43").await.unwrap().question_id, None);
}

#[tokio::test]
async fn fetch_question_decodes_record() {
    let api = client().await;
    let q = api.fetch_question("7").await.unwrap();
    assert_eq!(q.id, "7");
    assert_eq!(q.prompt, "Pick one");
    assert_eq!(q.answers, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn join_session_posts_user() {
    let api = client().await;
    let p = api.join_session("42", "ada").await.unwrap();
    assert_eq!(p.username, "ada");
    assert_eq!(p.id, "42-1");
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let api = client().await;
    let err = api.fetch_session("9").await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }), "{err:?}");
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let api = client().await;
    let err = api.fetch_session("44").await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_server_is_a_request_error() {
    let api = HttpApi::new("http://127.0.0.1:1", Some(Duration::from_secs(2))).unwrap();
    let err = api.fetch_question("7").await.unwrap_err();
    assert!(matches!(err, FetchError::Request(_)), "{err:?}");
}
