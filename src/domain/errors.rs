use thiserror::Error;

/// Failures from the two upstream generation steps.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// A credential needed for an upstream call is missing. Carries the
    /// setting name, e.g. `OPENAI_API_KEY`.
    #[error("{0} is not configured")]
    Configuration(String),
    #[error("failed to generate thumbnail prompt: {0}")]
    PromptGeneration(String),
    #[error("failed to generate image: {0}")]
    ImageGeneration(String),
}

impl GenerationError {
    pub fn missing_setting(name: &str) -> Self {
        GenerationError::Configuration(name.to_string())
    }
}
