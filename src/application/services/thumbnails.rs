use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{info, instrument};

use crate::application::errors::AppError;
use crate::domain::errors::GenerationError;
use crate::domain::generators::{ImageGenerator, PromptEnhancer};
use crate::domain::images::ReferenceImage;
use crate::domain::thumbnails::{
    BatchMode, MultipleThumbnailsRequest, Thumbnail, ThumbnailRequest,
};
use crate::domain::variations::VARIATION_COUNT;

/// How a photo batch is fanned out to the generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    pub mode: BatchMode,
    size: usize,
}

impl BatchSettings {
    /// `size` is clamped to `1..=VARIATION_COUNT`.
    pub fn new(mode: BatchMode, size: usize) -> Self {
        Self {
            mode,
            size: size.clamp(1, VARIATION_COUNT),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self::new(BatchMode::Parallel, VARIATION_COUNT)
    }
}

/// Sequences the prompt enhancer and the image generator.
#[derive(Clone)]
pub struct ThumbnailService {
    enhancer: Arc<dyn PromptEnhancer>,
    generator: Arc<dyn ImageGenerator>,
    batch: BatchSettings,
}

impl ThumbnailService {
    pub fn new(
        enhancer: Arc<dyn PromptEnhancer>,
        generator: Arc<dyn ImageGenerator>,
        batch: BatchSettings,
    ) -> Self {
        Self {
            enhancer,
            generator,
            batch,
        }
    }

    pub fn batch(&self) -> BatchSettings {
        self.batch
    }

    #[instrument(skip(self, request), fields(topic = %request.topic))]
    pub async fn create_thumbnail(
        &self,
        request: &ThumbnailRequest,
    ) -> Result<Thumbnail, AppError> {
        let prompt = self
            .enhancer
            .enhance(
                &request.topic,
                request.style.as_deref(),
                request.mood.as_deref(),
            )
            .await?;

        let image_url = self.generator.generate(&prompt, None).await?;

        info!(%image_url, "thumbnail generated");
        Ok(Thumbnail { prompt, image_url })
    }

    /// Generate one image per prompt variation, all-or-nothing.
    #[instrument(skip(self, request), fields(video_type = %request.video_type, mode = %self.batch.mode))]
    pub async fn create_batch(
        &self,
        request: MultipleThumbnailsRequest,
    ) -> Result<Vec<String>, AppError> {
        let variations: Vec<String> = request
            .prompt_variations()
            .into_iter()
            .take(self.batch.size)
            .collect();

        let job = Arc::new(BatchJob {
            enhancer: Arc::clone(&self.enhancer),
            generator: Arc::clone(&self.generator),
            style: request.style,
            mood: request.mood,
            photo: request.photo,
        });

        let urls = match self.batch.mode {
            BatchMode::Sequential => {
                let mut urls = Vec::with_capacity(variations.len());
                for variation in &variations {
                    urls.push(job.run(variation).await?);
                }
                urls
            }
            BatchMode::Parallel => {
                // A failed variant resolves the join early; siblings keep
                // running detached and their results are dropped.
                let handles = variations.into_iter().map(|variation| {
                    let job = Arc::clone(&job);
                    tokio::spawn(async move { job.run(&variation).await })
                });

                try_join_all(handles.map(|handle| async move {
                    match handle.await {
                        Ok(result) => result.map_err(AppError::from),
                        Err(e) => Err(AppError::unexpected(format!("thumbnail task failed: {e}"))),
                    }
                }))
                .await?
            }
        };

        info!(count = urls.len(), "thumbnail batch generated");
        Ok(urls)
    }
}

struct BatchJob {
    enhancer: Arc<dyn PromptEnhancer>,
    generator: Arc<dyn ImageGenerator>,
    style: String,
    mood: String,
    photo: ReferenceImage,
}

impl BatchJob {
    async fn run(&self, variation: &str) -> Result<String, GenerationError> {
        let prompt = self
            .enhancer
            .enhance(variation, Some(&self.style), Some(&self.mood))
            .await?;
        self.generator.generate(&prompt, Some(&self.photo)).await
    }
}
