use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Args;

use super::print_json;
use crate::domain::thumbnails::{
    DEFAULT_MOOD, DEFAULT_PLACEMENT, DEFAULT_STYLE, DEFAULT_VIDEO_TYPE, ThumbnailRequest,
    photo_description,
};
use crate::domain::variations::variations;
use crate::infrastructure::client::ThumbforgeClient;
use crate::infrastructure::client::thumbnails::BatchFields;

#[derive(Debug, Args)]
pub struct ThumbnailCommand {
    /// What the video is about
    #[arg(long)]
    pub topic: String,
    #[arg(long)]
    pub style: Option<String>,
    #[arg(long)]
    pub mood: Option<String>,
}

pub async fn create_thumbnail(client: &ThumbforgeClient, command: ThumbnailCommand) -> Result<()> {
    let payload = ThumbnailRequest::new(&command.topic, command.style, command.mood)
        .ok_or_else(|| anyhow!("--topic must not be blank"))?;

    let thumbnail = client.thumbnails().create(&payload).await?;
    print_json(&thumbnail)
}

#[derive(Debug, Args)]
pub struct ThumbnailsCommand {
    /// Path to the photo to build thumbnails from
    #[arg(long)]
    pub photo: PathBuf,
    /// Override the content type guessed from the file extension
    #[arg(long)]
    pub mime_type: Option<String>,
    #[arg(long)]
    pub video_type: Option<String>,
    #[arg(long)]
    pub style: Option<String>,
    #[arg(long)]
    pub mood: Option<String>,
    #[arg(long)]
    pub placement: Option<String>,
}

pub async fn create_thumbnails(
    client: &ThumbforgeClient,
    command: ThumbnailsCommand,
) -> Result<()> {
    let mime_type = match command.mime_type {
        Some(mime_type) => mime_type,
        None => guess_mime_type(&command.photo)
            .ok_or_else(|| {
                anyhow!(
                    "cannot tell the image type of {}; pass --mime-type",
                    command.photo.display()
                )
            })?
            .to_string(),
    };

    let photo = tokio::fs::read(&command.photo)
        .await
        .with_context(|| format!("failed to read {}", command.photo.display()))?;

    let file_name = command
        .photo
        .file_name()
        .map_or_else(|| "photo".to_string(), |n| n.to_string_lossy().into_owned());

    let fields = BatchFields {
        video_type: command.video_type,
        style: command.style,
        mood: command.mood,
        placement: command.placement,
    };

    let response = client
        .thumbnails()
        .create_batch(photo, &file_name, &mime_type, fields)
        .await?;
    print_json(&response)
}

#[derive(Debug, Args)]
pub struct VariationsCommand {
    #[arg(long, default_value = DEFAULT_VIDEO_TYPE)]
    pub video_type: String,
    #[arg(long, default_value = DEFAULT_STYLE)]
    pub style: String,
    #[arg(long, default_value = DEFAULT_MOOD)]
    pub mood: String,
    #[arg(long, default_value = DEFAULT_PLACEMENT)]
    pub placement: String,
}

pub fn print_variations(command: &VariationsCommand) -> Result<()> {
    let prompts = variations(
        &photo_description(&command.video_type),
        &command.video_type,
        &command.style,
        &command.mood,
        &command.placement,
    );
    print_json(&prompts)
}

fn guess_mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}
