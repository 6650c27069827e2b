use super::*;
use axum::http::header;

#[tokio::test]
async fn test_resource_info_returns_filtered_catalog() {
    let (app, _service, _temp_dir) = create_test_app(Arc::new(FakeExtractor::new())).await;

    let response = app
        .oneshot(post_json(
            "/resource/info",
            serde_json::json!({ "url": TEST_URL }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["duration"], 212);
    assert_eq!(json["view_count"], 42);

    let formats = json["formats"].as_array().unwrap();
    assert_eq!(formats.len(), 6, "3gp rendition is filtered out");
    let first = &formats[0];
    assert_eq!(first["format_id"], "140");
    assert_eq!(first["ext"], "m4a");
    assert_eq!(first["format_type"], "audio");
    assert_eq!(first["filesize"], 3_000_000);
    assert_eq!(first["quality"], 0);
}

#[tokio::test]
async fn test_video_info_alias() {
    let (app, _service, _temp_dir) = create_test_app(Arc::new(FakeExtractor::new())).await;

    let response = app
        .oneshot(post_json("/video/info", serde_json::json!({ "url": TEST_URL })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_resource_info_rejects_unsupported_url() {
    let extractor = Arc::new(FakeExtractor::new());
    let (app, _service, _temp_dir) = create_test_app(extractor.clone()).await;

    let response = app
        .oneshot(post_json(
            "/resource/info",
            serde_json::json!({ "url": "https://www.youtube.com/playlist?list=PL1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
    assert_eq!(extractor.catalog_calls(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() {
    let (app, _service, _temp_dir) = create_test_app(Arc::new(FakeExtractor::new())).await;

    let response = app
        .clone()
        .oneshot(post_json("/download", serde_json::json!({ "quality": "720" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "validation_error");

    let response = app
        .oneshot(post_json(
            "/download",
            serde_json::json!({ "url": TEST_URL, "format_type": "subtitles" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_streams_attachment() {
    let extractor = Arc::new(FakeExtractor::new());
    let (app, service, _temp_dir) = create_test_app(extractor.clone()).await;

    let response = app
        .oneshot(post_json(
            "/download",
            serde_json::json!({ "url": TEST_URL, "quality": "720", "format_type": "video" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(headers[header::CONTENT_LENGTH], "18");
    assert!(
        headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("attachment; filename=\"Test VideoClip HD.mp4\"")
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"fake media payload");
    assert_eq!(extractor.requested_formats(), vec!["22"]);
    assert!(
        std::fs::read_dir(&service.config.scratch_dir)
            .unwrap()
            .next()
            .is_none(),
        "scratch dir empty once the stream is consumed"
    );
}

#[tokio::test]
async fn test_download_defaults_to_720_video() {
    let extractor = Arc::new(FakeExtractor::new());
    let (app, _service, _temp_dir) = create_test_app(extractor.clone()).await;

    let response = app
        .oneshot(post_json("/download", serde_json::json!({ "url": TEST_URL })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extractor.requested_formats(), vec!["22"]);
}

#[tokio::test]
async fn test_download_no_match_is_404() {
    let extractor = Arc::new(FakeExtractor::with_formats(vec![]));
    let (app, _service, _temp_dir) = create_test_app(extractor.clone()).await;

    let response = app
        .oneshot(post_json(
            "/download",
            serde_json::json!({ "url": TEST_URL, "format_type": "audio" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "no_matching_format");
    assert_eq!(json["error"]["details"]["format_type"], "audio");
    assert_eq!(extractor.transfer_calls(), 0);
}

#[tokio::test]
async fn test_download_exhausted_is_client_error_with_reason() {
    let extractor = Arc::new(FakeExtractor::failing(u32::MAX));
    let (app, service, _temp_dir) = create_test_app(extractor.clone()).await;

    let response = app
        .oneshot(post_json(
            "/download",
            serde_json::json!({ "url": TEST_URL, "quality": 1080 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "fetch_failed");
    assert_eq!(json["error"]["details"]["attempts"], 3);
    assert!(
        json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("403")
    );
    assert_eq!(extractor.transfer_calls(), 3);
    assert!(
        std::fs::read_dir(&service.config.scratch_dir)
            .unwrap()
            .next()
            .is_none()
    );
}

#[tokio::test]
async fn test_missing_provider_is_client_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = crate::service::test_helpers::test_config(&temp_dir.path().join("scratch"));
    let service = Arc::new(MediaService::new(config, Arc::new(crate::extractor::NoOpExtractor)).unwrap());
    service.init().await.unwrap();
    let app = create_router(service.clone(), service.config.clone());

    for (uri, body) in [
        ("/resource/info", serde_json::json!({ "url": TEST_URL })),
        ("/download", serde_json::json!({ "url": TEST_URL, "quality": "720" })),
    ] {
        let response = app.clone().oneshot(post_json(uri, body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "not_supported");
        assert!(
            json["error"]["message"]
                .as_str()
                .unwrap()
                .contains("yt-dlp")
        );
    }
}
