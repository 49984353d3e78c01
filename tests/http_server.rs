//! Integration tests for the HTTP server.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use kvs::server::Server;
use kvs::{KvStore, KvsEngine, MemKvsEngine};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn setup_test_app() -> Router {
    Server::new(MemKvsEngine::new()).router()
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(body) => Body::from(body.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_create_key_value() {
    let app = setup_test_app();

    let (status, body) = send(&app, Method::POST, "/kv/testkey", Some(json!({"value": "testvalue"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"key": "testkey", "value": "testvalue"}));
}

#[tokio::test]
async fn test_read_key_value() {
    let app = setup_test_app();
    send(&app, Method::POST, "/kv/testkey", Some(json!({"value": "testvalue"}))).await;

    let (status, body) = send(&app, Method::GET, "/kv/testkey", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"key": "testkey", "value": "testvalue"}));
}

#[tokio::test]
async fn test_list_keys() {
    let app = setup_test_app();
    send(&app, Method::POST, "/kv/key1", Some(json!({"value": "value1"}))).await;
    send(&app, Method::POST, "/kv/key2", Some(json!({"value": "value2"}))).await;

    let (status, body) = send(&app, Method::GET, "/kv/", None).await;

    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.contains(&json!({"key": "key1", "value": "value1"})));
    assert!(entries.contains(&json!({"key": "key2", "value": "value2"})));
}

#[tokio::test]
async fn test_list_empty_store() {
    let app = setup_test_app();

    let (status, body) = send(&app, Method::GET, "/kv/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_delete_key() {
    let app = setup_test_app();
    send(&app, Method::POST, "/kv/testkey", Some(json!({"value": "testvalue"}))).await;

    let (status, body) = send(&app, Method::DELETE, "/kv/testkey", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Key deleted successfully"}));

    let (status, _) = send(&app, Method::GET, "/kv/testkey", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_missing_key() {
    let app = setup_test_app();

    let (status, body) = send(&app, Method::DELETE, "/kv/nonexistent", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Key not found"}));
}

#[tokio::test]
async fn test_update_key() {
    let app = setup_test_app();
    send(&app, Method::POST, "/kv/testkey", Some(json!({"value": "value1"}))).await;

    let (status, body) = send(&app, Method::POST, "/kv/testkey", Some(json!({"value": "value2"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"key": "testkey", "value": "value2"}));

    let (_, body) = send(&app, Method::GET, "/kv/", None).await;
    assert_eq!(body, json!([{"key": "testkey", "value": "value2"}]));
}

#[tokio::test]
async fn test_key_not_found() {
    let app = setup_test_app();

    let (status, body) = send(&app, Method::GET, "/kv/nonexistent", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Key not found"}));
}

#[tokio::test]
async fn test_empty_value_is_accepted() {
    let app = setup_test_app();

    let (status, body) = send(&app, Method::POST, "/kv/blank", Some(json!({"value": ""}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"key": "blank", "value": ""}));
}

#[tokio::test]
async fn test_body_without_value_is_rejected() {
    let app = setup_test_app();

    let (status, _) = send(&app, Method::POST, "/kv/testkey", Some(json!({"other": 1}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, Method::GET, "/kv/testkey", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_durable_engine_behind_server() {
    let temp_dir = TempDir::new().unwrap();
    let store = KvStore::open(temp_dir.path()).unwrap();
    let app = Server::new(store.clone()).router();

    send(&app, Method::POST, "/kv/persisted", Some(json!({"value": "yes"}))).await;
    store.flush().unwrap();
    drop(app);
    drop(store);

    let reopened = KvStore::open(temp_dir.path()).unwrap();
    assert_eq!(reopened.get("persisted".to_owned()).unwrap().value, "yes");
}
