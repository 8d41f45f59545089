pub mod client;
pub mod image_generator;
pub mod prompt_enhancer;
pub mod retry;
pub mod storage;
