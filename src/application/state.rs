use std::path::PathBuf;
use std::sync::Arc;

use crate::application::services::{BatchSettings, ThumbnailService};
use crate::domain::generators::{ImageGenerator, PromptEnhancer};
use crate::infrastructure::image_generator::{
    DEFAULT_IMAGE_MODEL, GEMINI_API_URL, GeminiImageGenerator,
};
use crate::infrastructure::prompt_enhancer::{
    DEFAULT_TEXT_MODEL, OPENAI_CHAT_URL, OpenAiPromptEnhancer,
};
use crate::infrastructure::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::infrastructure::storage::ImageStore;

/// Everything that varies between production and test environments:
/// upstream endpoints, credentials, storage location and retry timing.
pub struct AppStateConfig {
    pub base_url: String,
    pub upload_dir: PathBuf,
    pub openai_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub gemini_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub batch: BatchSettings,
    pub retry_policy: RetryPolicy,
    pub sleeper: Arc<dyn Sleeper>,
}

impl Default for AppStateConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            openai_url: OPENAI_CHAT_URL.to_string(),
            openai_api_key: None,
            openai_model: DEFAULT_TEXT_MODEL.to_string(),
            gemini_url: GEMINI_API_URL.to_string(),
            gemini_api_key: None,
            gemini_model: DEFAULT_IMAGE_MODEL.to_string(),
            batch: BatchSettings::default(),
            retry_policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub thumbnail_service: ThumbnailService,
    pub upload_dir: PathBuf,
}

impl AppState {
    /// Wire the real OpenAI and Gemini clients from config.
    pub fn from_config(config: AppStateConfig) -> Self {
        // No client-wide timeout: the image call sets its own per-attempt deadline.
        #[allow(clippy::expect_used)]
        let http_client = reqwest::ClientBuilder::new()
            .build()
            .expect("Failed to build HTTP client");

        let store = ImageStore::new(&config.upload_dir, &config.base_url);

        let enhancer: Arc<dyn PromptEnhancer> = Arc::new(OpenAiPromptEnhancer::new(
            http_client.clone(),
            config.openai_url,
            config.openai_api_key,
            config.openai_model,
        ));
        let generator: Arc<dyn ImageGenerator> = Arc::new(
            GeminiImageGenerator::new(
                http_client,
                config.gemini_url,
                config.gemini_api_key,
                config.gemini_model,
                store,
            )
            .with_retry(config.retry_policy, config.sleeper),
        );

        Self::new(enhancer, generator, config.batch, config.upload_dir)
    }

    pub fn new(
        enhancer: Arc<dyn PromptEnhancer>,
        generator: Arc<dyn ImageGenerator>,
        batch: BatchSettings,
        upload_dir: PathBuf,
    ) -> Self {
        Self {
            thumbnail_service: ThumbnailService::new(enhancer, generator, batch),
            upload_dir,
        }
    }
}
