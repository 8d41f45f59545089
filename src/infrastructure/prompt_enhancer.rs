use std::fmt::Write;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::domain::errors::GenerationError;
use crate::domain::generators::PromptEnhancer;

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_TEXT_MODEL: &str = "gpt-4.1-mini";
pub const OPENAI_API_KEY_SETTING: &str = "OPENAI_API_KEY";
const USER_AGENT: &str = "Thumbforge/1.0";
const TEMPERATURE: f32 = 0.8;
const MAX_TOKENS: u32 = 300;

const SYSTEM_PROMPT: &str = r#"You are an expert at creating compelling image generation prompts for YouTube thumbnails.
Your task is to take a video topic and transform it into a detailed, visually-striking prompt that will generate an eye-catching thumbnail.
Focus on:
- Bold, vibrant colors
- Clear focal points
- High contrast
- Emotional impact
- Professional quality
- YouTube thumbnail best practices (1280x720, readable text areas)"#;

fn user_prompt(topic: &str, style: Option<&str>, mood: Option<&str>) -> String {
    let mut prompt = format!(
        "Create an image generation prompt for a YouTube thumbnail about: \"{}\"\n",
        topic.trim()
    );

    if let Some(style) = style.map(str::trim).filter(|s| !s.is_empty()) {
        let _ = writeln!(prompt, "Style preference: {style}");
    }
    if let Some(mood) = mood.map(str::trim).filter(|s| !s.is_empty()) {
        let _ = writeln!(prompt, "Mood/tone: {mood}");
    }

    prompt.push_str("\nReturn ONLY the image generation prompt, nothing else.");
    prompt
}

/// Prompt enhancer backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAiPromptEnhancer {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiPromptEnhancer {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.into(),
        }
    }
}

#[async_trait]
impl PromptEnhancer for OpenAiPromptEnhancer {
    async fn enhance(
        &self,
        topic: &str,
        style: Option<&str>,
        mood: Option<&str>,
    ) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::missing_setting(OPENAI_API_KEY_SETTING))?;

        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user",
                    content: user_prompt(topic, style, mood),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!(model = %self.model, topic, "requesting thumbnail prompt");

        let response = self
            .client
            .post(&self.url)
            .header("User-Agent", USER_AGENT)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "OpenAI request failed");
                GenerationError::PromptGeneration(format!("OpenAI request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "(unreadable body)".to_string());
            error!(%status, body = %body, "OpenAI returned an error status");
            return Err(GenerationError::PromptGeneration(format!(
                "OpenAI returned status {status}: {body}"
            )));
        }

        let body = response.text().await.map_err(|e| {
            GenerationError::PromptGeneration(format!("Failed to read OpenAI response body: {e}"))
        })?;

        let chat_response: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            GenerationError::PromptGeneration(format!("Failed to parse OpenAI response: {e}"))
        })?;

        first_completion(chat_response).ok_or_else(|| {
            GenerationError::PromptGeneration("OpenAI returned an empty completion".to_string())
        })
    }
}

fn first_completion(response: ChatResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

// --- OpenAI API types ---

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
