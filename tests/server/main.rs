mod batch_api;
mod image_generation;
