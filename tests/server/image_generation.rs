use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{GEMINI_PATH, OPENAI_PATH, TestApp, spawn_app_with_mocks};
use crate::thumbnail_api::{mock_gemini_image, mock_openai_response};

async fn mount_prompt(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(OPENAI_PATH))
        .respond_with(mock_openai_response("A neon cat"))
        .mount(mock_server)
        .await;
}

async fn request_thumbnail(app: &TestApp) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(app.api_url("/thumbnail"))
        .json(&json!({ "topic": "cats" }))
        .send()
        .await
        .expect("Failed to execute request");
    let status = response.status();
    (status, response.json().await.expect("Failed to parse response"))
}

fn rate_limited() -> ResponseTemplate {
    ResponseTemplate::new(429).set_body_json(json!({
        "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
    }))
}

#[tokio::test]
async fn rate_limits_are_retried_with_exponential_backoff() {
    let app = spawn_app_with_mocks().await;
    let mock_server = app.mock_server.as_ref().unwrap();
    mount_prompt(mock_server).await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(rate_limited())
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(mock_gemini_image(b"third-time-lucky"))
        .expect(1)
        .mount(mock_server)
        .await;

    let (status, body) = request_thumbnail(&app).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(
        app.sleeper.delays(),
        vec![Duration::from_millis(2000), Duration::from_millis(4000)]
    );
}

#[tokio::test]
async fn resource_exhausted_body_counts_as_rate_limit() {
    let app = spawn_app_with_mocks().await;
    let mock_server = app.mock_server.as_ref().unwrap();
    mount_prompt(mock_server).await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": { "code": 503, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED" }
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(mock_gemini_image(b"ok"))
        .mount(mock_server)
        .await;

    let (status, _) = request_thumbnail(&app).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.sleeper.delays(), vec![Duration::from_millis(2000)]);
}

#[tokio::test]
async fn non_rate_limit_errors_are_not_retried() {
    let app = spawn_app_with_mocks().await;
    let mock_server = app.mock_server.as_ref().unwrap();
    mount_prompt(mock_server).await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "Invalid prompt", "status": "INVALID_ARGUMENT" }
        })))
        .expect(1)
        .mount(mock_server)
        .await;

    let (status, body) = request_thumbnail(&app).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to generate thumbnail");
    assert!(body["message"].as_str().unwrap().contains("Invalid prompt"));
    assert!(app.sleeper.delays().is_empty());
}

#[tokio::test]
async fn missing_image_data_is_not_retried() {
    let app = spawn_app_with_mocks().await;
    let mock_server = app.mock_server.as_ref().unwrap();
    mount_prompt(mock_server).await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "I can only describe it" }] } }]
        })))
        .expect(1)
        .mount(mock_server)
        .await;

    let (status, body) = request_thumbnail(&app).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["message"],
        "failed to generate image: No image data in Gemini response"
    );
    assert!(app.sleeper.delays().is_empty());
    assert_eq!(std::fs::read_dir(app.upload_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn persistent_rate_limit_gives_up_after_three_attempts() {
    let app = spawn_app_with_mocks().await;
    let mock_server = app.mock_server.as_ref().unwrap();
    mount_prompt(mock_server).await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(rate_limited())
        .expect(3)
        .mount(mock_server)
        .await;

    let (status, body) = request_thumbnail(&app).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("after 3 attempts")
    );
    assert_eq!(
        app.sleeper.delays(),
        vec![Duration::from_millis(2000), Duration::from_millis(4000)]
    );
}

#[tokio::test]
async fn image_request_asks_for_widescreen_images() {
    let app = spawn_app_with_mocks().await;
    let mock_server = app.mock_server.as_ref().unwrap();
    mount_prompt(mock_server).await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{ "text": "A neon cat" }] }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
                "imageConfig": { "aspectRatio": "16:9" }
            }
        })))
        .respond_with(mock_gemini_image(b"wide"))
        .expect(1)
        .mount(mock_server)
        .await;

    let (status, body) = request_thumbnail(&app).await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
}
