use async_trait::async_trait;

use crate::domain::errors::GenerationError;
use crate::domain::images::ReferenceImage;

/// Turns a raw topic into a refined image-generation prompt.
#[async_trait]
pub trait PromptEnhancer: Send + Sync {
    async fn enhance(
        &self,
        topic: &str,
        style: Option<&str>,
        mood: Option<&str>,
    ) -> Result<String, GenerationError>;
}

/// Renders a prompt (plus an optional reference photo) into a stored image
/// and returns its public URL.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        reference: Option<&ReferenceImage>,
    ) -> Result<String, GenerationError>;
}
