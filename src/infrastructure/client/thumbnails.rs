use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};

use super::ThumbforgeClient;
use crate::domain::thumbnails::{ThumbnailRequest, ThumbnailResponse, ThumbnailsResponse};

/// Optional text fields sent alongside the photo upload.
#[derive(Debug, Clone, Default)]
pub struct BatchFields {
    pub video_type: Option<String>,
    pub style: Option<String>,
    pub mood: Option<String>,
    pub placement: Option<String>,
}

pub struct ThumbnailsClient<'a> {
    client: &'a ThumbforgeClient,
}

impl<'a> ThumbnailsClient<'a> {
    pub fn new(client: &'a ThumbforgeClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, payload: &ThumbnailRequest) -> Result<ThumbnailResponse> {
        let url = self.client.endpoint("api/thumbnail")?;
        let response = self.client.http().post(url).json(payload).send().await?;
        self.client.handle_response(response).await
    }

    pub async fn create_batch(
        &self,
        photo: Vec<u8>,
        file_name: &str,
        mime_type: &str,
        fields: BatchFields,
    ) -> Result<ThumbnailsResponse> {
        let part = Part::bytes(photo)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .with_context(|| format!("invalid photo content type: {mime_type}"))?;

        let mut form = Form::new().part("photo", part);
        for (name, value) in [
            ("videoType", fields.video_type),
            ("style", fields.style),
            ("mood", fields.mood),
            ("placement", fields.placement),
        ] {
            if let Some(value) = value {
                form = form.text(name, value);
            }
        }

        let url = self.client.endpoint("api/thumbnails")?;
        let response = self.client.http().post(url).multipart(form).send().await?;
        self.client.handle_response(response).await
    }
}
