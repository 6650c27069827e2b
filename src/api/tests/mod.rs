use super::*;
use crate::service::test_helpers::{FakeExtractor, TEST_URL, create_test_service};
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use std::time::Duration;
use tower::ServiceExt;

mod media;

/// Router over a service backed by `extractor`. The tempdir must be kept alive.
async fn create_test_app(extractor: Arc<FakeExtractor>) -> (Router, Arc<MediaService>, tempfile::TempDir) {
    let (service, temp_dir) = create_test_service(extractor).await;
    let service = Arc::new(service);
    let config = service.config.clone();
    (create_router(service.clone(), config), service, temp_dir)
}

/// POST `body` as JSON to `uri`
fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns_and_shuts_down() {
    let (service, _temp_dir) = create_test_service(Arc::new(FakeExtractor::new())).await;

    let mut config = (*service.config).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let api_handle = tokio::spawn(start_api_server(Arc::new(service), config, async move {
        let _ = rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), api_handle)
        .await
        .expect("server stops after shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let (service, _temp_dir) = create_test_service(Arc::new(FakeExtractor::new())).await;

    let mut config = (*service.config).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let app = create_router(Arc::new(service), Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let (service, _temp_dir) = create_test_service(Arc::new(FakeExtractor::new())).await;

    let mut config = (*service.config).clone();
    config.server.api.cors_origins = vec!["http://localhost:3000".to_string()];
    let app = create_router(Arc::new(service), Arc::new(config));

    let allowed = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );

    let denied = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(!denied.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_cors_disabled() {
    let (service, _temp_dir) = create_test_service(Arc::new(FakeExtractor::new())).await;

    let mut config = (*service.config).clone();
    config.server.api.cors_enabled = false;
    let app = create_router(Arc::new(service), Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let (service, _temp_dir) = create_test_service(Arc::new(FakeExtractor::new())).await;
    let service = Arc::new(service);

    let enabled = create_router(service.clone(), service.config.clone());
    let response = enabled
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut config = (*service.config).clone();
    config.server.api.swagger_ui = false;
    let disabled = create_router(service, Arc::new(config));
    let response = disabled
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _service, _temp_dir) = create_test_app(Arc::new(FakeExtractor::new())).await;

    let response = app
        .oneshot(post_json("/resource/unknown", serde_json::json!({"url": TEST_URL})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
