use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// An image written to the upload directory. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub path: PathBuf,
    pub url: String,
}

/// A caller-supplied photo sent inline alongside the text prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl ReferenceImage {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }
}
