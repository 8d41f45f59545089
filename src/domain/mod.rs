pub mod errors;
pub mod generators;
pub mod images;
pub mod thumbnails;
pub mod variations;

// Re-exports
pub use errors::GenerationError;
pub use generators::{ImageGenerator, PromptEnhancer};
