use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domain::errors::GenerationError;
use crate::domain::generators::ImageGenerator;
use crate::domain::images::ReferenceImage;
use crate::infrastructure::retry::{Backoff, RetryDecision, RetryPolicy, Sleeper, TokioSleeper};
use crate::infrastructure::storage::ImageStore;

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const GEMINI_API_KEY_SETTING: &str = "GEMINI_API_KEY";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const ASPECT_RATIO: &str = "16:9";
const RATE_LIMIT_STATUS: &str = "RESOURCE_EXHAUSTED";

/// One failed call to the image API, classified for the retry loop.
#[derive(Debug, Error)]
enum AttemptError {
    #[error("rate limited ({status}): {message}")]
    RateLimited { status: StatusCode, message: String },
    #[error("Gemini returned status {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("Gemini request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Gemini request failed: {0}")]
    Transport(String),
    #[error("{0}")]
    Malformed(String),
}

impl AttemptError {
    fn is_rate_limit(&self) -> bool {
        matches!(self, AttemptError::RateLimited { .. })
    }
}

/// Image generator backed by a Gemini-compatible `generateContent` endpoint.
/// Returned images are written to the [`ImageStore`].
pub struct GeminiImageGenerator {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    store: ImageStore,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    request_timeout: Duration,
}

impl GeminiImageGenerator {
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        store: ImageStore,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.into(),
            store,
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_retry(mut self, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        self.policy = policy;
        self.sleeper = sleeper;
        self
    }

    /// Deadline for a single attempt; defaults to 60 seconds.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn attempt(
        &self,
        api_key: &str,
        body: &GenerateContentRequest<'_>,
    ) -> Result<Vec<u8>, AttemptError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .timeout(self.request_timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AttemptError::Timeout(self.request_timeout)
                } else {
                    AttemptError::Transport(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            AttemptError::Malformed(format!("Failed to parse Gemini response: {e}"))
        })?;

        extract_image(parsed)
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageGenerator {
    async fn generate(
        &self,
        prompt: &str,
        reference: Option<&ReferenceImage>,
    ) -> Result<String, GenerationError> {
        if prompt.trim().is_empty() {
            return Err(GenerationError::ImageGeneration(
                "prompt must not be empty".to_string(),
            ));
        }

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::missing_setting(GEMINI_API_KEY_SETTING))?;

        let body = GenerateContentRequest::new(prompt, reference);
        let mut backoff = Backoff::new(self.policy);

        let bytes = loop {
            match self.attempt(api_key, &body).await {
                Ok(bytes) => break bytes,
                Err(err) => match backoff.next(err.is_rate_limit()) {
                    RetryDecision::RetryAfter(delay) => {
                        warn!(
                            attempt = backoff.attempts(),
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            error = %err,
                            "image generation rate limited, retrying"
                        );
                        self.sleeper.sleep(delay).await;
                    }
                    RetryDecision::GiveUp => {
                        error!(attempts = backoff.attempts(), error = %err, "image generation failed");
                        return Err(give_up_error(&err, backoff.attempts()));
                    }
                },
            }
        };

        let image = self.store.save(&bytes).await.map_err(|e| {
            GenerationError::ImageGeneration(format!("Failed to store generated image: {e}"))
        })?;

        info!(
            filename = %image.filename,
            bytes = image.bytes.len(),
            attempts = backoff.attempts() + 1,
            "thumbnail image stored"
        );

        Ok(image.url)
    }
}

fn give_up_error(err: &AttemptError, attempts: u32) -> GenerationError {
    let detail = match err {
        AttemptError::RateLimited { .. } => format!("still {err} after {attempts} attempts"),
        _ => err.to_string(),
    };
    GenerationError::ImageGeneration(detail)
}

fn classify_failure(status: StatusCode, body: &str) -> AttemptError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let upstream_status = envelope.as_ref().and_then(|e| e.error.status.as_deref());
    let message = envelope
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .unwrap_or_else(|| body.trim().to_string());

    if status == StatusCode::TOO_MANY_REQUESTS || upstream_status == Some(RATE_LIMIT_STATUS) {
        AttemptError::RateLimited { status, message }
    } else {
        AttemptError::Status { status, message }
    }
}

/// Pull the first inline image out of a response. Text parts are only logged.
fn extract_image(response: GenerateContentResponse) -> Result<Vec<u8>, AttemptError> {
    let parts = response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts);

    let mut saw_part = false;
    for part in parts {
        saw_part = true;
        if let Some(text) = part.text.as_deref().filter(|t| !t.trim().is_empty()) {
            debug!(text, "Gemini returned text alongside the image");
        }
        if let Some(inline) = part.inline_data {
            return STANDARD.decode(inline.data.trim()).map_err(|e| {
                AttemptError::Malformed(format!("Gemini returned undecodable image data: {e}"))
            });
        }
    }

    if saw_part {
        Err(AttemptError::Malformed(
            "No image data in Gemini response".to_string(),
        ))
    } else {
        Err(AttemptError::Malformed(
            "Gemini response contained no parts".to_string(),
        ))
    }
}

// --- Gemini API types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str, reference: Option<&ReferenceImage>) -> Self {
        let mut parts = vec![RequestPart::Text { text: prompt }];
        if let Some(image) = reference {
            parts.push(RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.to_base64(),
                },
            });
        }

        Self {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE"],
                image_config: ImageConfig {
                    aspect_ratio: ASPECT_RATIO,
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<ResponseInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseInlineData {
    #[allow(dead_code)]
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}
