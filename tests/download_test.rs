use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use rust_audio_backend::config::AppConfig;
use rust_audio_backend::infrastructure::database;
use rust_audio_backend::services::storage::LocalStorage;
use rust_audio_backend::services::yandex::YandexOAuthClient;
use rust_audio_backend::{AppState, create_app};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "---------------------------123456789012345678901234567";

async fn setup_test_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1);
    let db = Database::connect(opt).await.unwrap();
    database::run_migrations(&db).await.unwrap();
    db
}

async fn setup_state(storage_dir: &std::path::Path) -> AppState {
    let db = setup_test_db().await;
    let config = AppConfig::development();
    AppState {
        db,
        storage: Arc::new(LocalStorage::new(storage_dir)),
        oauth: Arc::new(YandexOAuthClient::new(&config)),
        config,
    }
}

async fn register_and_login(app: &axum::Router, username: &str, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header("Content-Type", "application/json")
                .body(Body::from(format!(
                    r#"{{"username": "{username}", "email": "{email}", "password": "pw12345678"}}"#
                )))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let form =
        serde_urlencoded::to_string([("username", username), ("password", "pw12345678")]).unwrap();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    json["access_token"].as_str().unwrap().to_string()
}

async fn upload_song(app: &axum::Router, token: &str, data: &[u8]) -> i64 {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"song.mp3\"\r\n\
             Content-Type: audio/mpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/audio/upload")
                .header("Authorization", format!("Bearer {}", token))
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    json["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_owner_can_stream_file() {
    let dir = tempfile::tempdir().unwrap();
    let state = setup_state(dir.path()).await;
    let app = create_app(state);
    let token = register_and_login(&app, "owner", "o@x.com").await;

    let data = vec![7u8; 128 * 1024];
    let id = upload_song(&app, &token, &data).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/audio/{}/file", id))
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "audio/mpeg"
    );
    assert_eq!(response.headers().get("accept-ranges").unwrap(), "bytes");
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("inline; filename="));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.len(), data.len());
    assert_eq!(&body[..], &data[..]);
}

#[tokio::test]
async fn test_token_accepted_via_query_param() {
    let dir = tempfile::tempdir().unwrap();
    let state = setup_state(dir.path()).await;
    let app = create_app(state);
    let token = register_and_login(&app, "owner", "o@x.com").await;
    let id = upload_song(&app, &token, b"mp3bytes").await;

    // Media elements cannot set headers; the token rides the query string
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/audio/{}/file?token={}", id, token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_non_authorized_principal_gets_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    let state = setup_state(dir.path()).await;
    let app = create_app(state);
    let owner_token = register_and_login(&app, "owner", "o@x.com").await;
    let other_token = register_and_login(&app, "other", "p@x.com").await;

    let id = upload_song(&app, &owner_token, b"mp3bytes").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/audio/{}/file", id))
                .header("Authorization", format!("Bearer {}", other_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_id_gets_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = setup_state(dir.path()).await;
    let app = create_app(state);
    let token = register_and_login(&app, "owner", "o@x.com").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/audio/424242/file")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_object_on_disk_yields_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = setup_state(dir.path()).await;
    let app = create_app(state);
    let token = register_and_login(&app, "owner", "o@x.com").await;
    let id = upload_song(&app, &token, b"mp3bytes").await;

    // Remove the object behind the record's back
    for entry in std::fs::read_dir(dir.path()).unwrap() {
        std::fs::remove_file(entry.unwrap().path()).unwrap();
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/audio/{}/file", id))
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
