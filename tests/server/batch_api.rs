use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use thumbforge::application::services::BatchSettings;
use thumbforge::domain::thumbnails::BatchMode;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::Mock;

use crate::helpers::{
    GEMINI_PATH, OPENAI_PATH, StubEnhancer, StubGenerator, TestApp, spawn_app,
    spawn_app_with_mocks, spawn_app_with_stubs, test_photo,
};
use crate::thumbnail_api::{mock_gemini_image, mock_openai_response};

async fn post_form(app: &TestApp, route: &str, form: Form) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(app.api_url(route))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request");
    let status = response.status();
    (status, response.json().await.expect("Failed to parse response"))
}

#[tokio::test]
async fn batch_returns_one_url_per_variation() {
    let enhancer = StubEnhancer::returning("P");
    let generator = StubGenerator::returning("http://x/img.png");
    let app = spawn_app_with_stubs(enhancer.clone(), generator.clone(), BatchSettings::default())
        .await;

    let form = Form::new()
        .part("photo", test_photo())
        .text("videoType", "Tech video");
    let (status, body) = post_form(&app, "/thumbnails", form).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(
        body,
        json!({ "thumbnails": ["http://x/img.png", "http://x/img.png", "http://x/img.png"] })
    );
    assert_eq!(enhancer.call_count(), 3);

    let references = generator.references();
    assert_eq!(references.len(), 3);
    for reference in references {
        let photo = reference.expect("photo forwarded to generator");
        assert_eq!(photo.mime_type, "image/jpeg");
        assert_eq!(photo.data, vec![0xff, 0xd8, 0xff, 0xe0]);
    }
}

#[tokio::test]
async fn generate_thumbnails_alias_is_routed() {
    let app = spawn_app().await;

    let form = Form::new().part("photo", test_photo());
    let (status, body) = post_form(&app, "/generate-thumbnails", form).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["thumbnails"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn missing_photo_is_rejected() {
    let generator = StubGenerator::returning("http://x/img.png");
    let app = spawn_app_with_stubs(
        StubEnhancer::returning("P"),
        generator.clone(),
        BatchSettings::default(),
    )
    .await;

    let form = Form::new().text("videoType", "Tech video");
    let (status, body) = post_form(&app, "/thumbnails", form).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Photo is required" }));
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn non_multipart_body_is_rejected() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .post(app.api_url("/thumbnails"))
        .json(&json!({ "videoType": "Tech video" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Photo is required");
}

#[tokio::test]
async fn second_photo_is_rejected() {
    let app = spawn_app().await;

    let form = Form::new()
        .part("photo", test_photo())
        .part("photo", test_photo());
    let (status, body) = post_form(&app, "/thumbnails", form).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Exactly one photo must be uploaded");
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let app = spawn_app().await;

    let notes = Part::bytes(b"just text".to_vec())
        .file_name("notes.txt")
        .mime_str("text/plain")
        .unwrap();
    let form = Form::new().part("photo", notes);
    let (status, body) = post_form(&app, "/thumbnails", form).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Photo must be an image");
}

#[tokio::test]
async fn sequential_single_variant_deployment() {
    let generator = StubGenerator::returning("http://x/img.png");
    let app = spawn_app_with_stubs(
        StubEnhancer::returning("P"),
        generator.clone(),
        BatchSettings::new(BatchMode::Sequential, 1),
    )
    .await;

    let form = Form::new().part("photo", test_photo());
    let (status, body) = post_form(&app, "/thumbnails", form).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "thumbnails": ["http://x/img.png"] }));
    assert_eq!(generator.call_count(), 1);
}

#[tokio::test]
async fn any_variant_failure_fails_the_batch() {
    let app = spawn_app_with_stubs(
        StubEnhancer::returning("P"),
        StubGenerator::failing("quota exhausted"),
        BatchSettings::default(),
    )
    .await;

    let form = Form::new().part("photo", test_photo());
    let (status, body) = post_form(&app, "/thumbnails", form).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to generate thumbnails");
    assert_eq!(body["message"], "failed to generate image: quota exhausted");
    assert!(body.get("thumbnails").is_none());
}

#[tokio::test]
async fn batch_end_to_end_sends_photo_inline() {
    let app = spawn_app_with_mocks().await;
    let mock_server = app.mock_server.as_ref().unwrap();

    Mock::given(method("POST"))
        .and(path(OPENAI_PATH))
        .respond_with(mock_openai_response("A presenter pointing at a laptop"))
        .expect(3)
        .mount(mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(body_partial_json(json!({
            "contents": [{
                "parts": [
                    { "text": "A presenter pointing at a laptop" },
                    { "inlineData": { "mimeType": "image/jpeg", "data": "/9j/4A==" } }
                ]
            }]
        })))
        .respond_with(mock_gemini_image(b"variant"))
        .expect(3)
        .mount(mock_server)
        .await;

    let form = Form::new()
        .part("photo", test_photo())
        .text("videoType", "Tech video")
        .text("style", "")
        .text("placement", "left");
    let (status, body) = post_form(&app, "/thumbnails", form).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    let urls = body["thumbnails"].as_array().unwrap();
    assert_eq!(urls.len(), 3);
    for url in urls {
        assert!(url.as_str().unwrap().starts_with(&app.page_url("/uploads/")));
    }
    assert_eq!(std::fs::read_dir(app.upload_dir.path()).unwrap().count(), 3);

    let requests = mock_server.received_requests().await.unwrap();
    let instructions: Vec<String> = requests
        .iter()
        .filter(|r| r.url.path() == OPENAI_PATH)
        .map(|r| {
            let chat: Value = r.body_json().unwrap();
            chat["messages"][1]["content"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(instructions.len(), 3);
    assert!(instructions.iter().all(|i| i.contains("Style preference: professional")));
    assert!(
        instructions
            .iter()
            .all(|i| i.contains("Photo uploaded for Tech video thumbnail"))
    );
    assert!(instructions.iter().all(|i| i.contains("positioned left")));
}

#[tokio::test]
async fn oversized_photo_gets_json_413() {
    let generator = StubGenerator::returning("http://x/img.png");
    let app = spawn_app_with_stubs(
        StubEnhancer::returning("P"),
        generator.clone(),
        BatchSettings::default(),
    )
    .await;

    let photo = Part::bytes(vec![0u8; 11 * 1024 * 1024])
        .file_name("huge.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let form = Form::new().part("photo", photo);
    let response = reqwest::Client::new()
        .post(app.api_url("/thumbnails"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Request body too large");
    assert!(body["message"].is_string());
    assert_eq!(generator.call_count(), 0);
}
