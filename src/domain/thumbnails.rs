use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::images::ReferenceImage;
use crate::domain::variations::{VARIATION_COUNT, variations};

pub const DEFAULT_VIDEO_TYPE: &str = "YouTube video";
pub const DEFAULT_STYLE: &str = "professional";
pub const DEFAULT_MOOD: &str = "engaging";
pub const DEFAULT_PLACEMENT: &str = "center";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailRequest {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
}

impl ThumbnailRequest {
    /// Returns `None` when the topic is blank. Blank hints are dropped.
    pub fn new(topic: &str, style: Option<String>, mood: Option<String>) -> Option<Self> {
        let topic = non_blank(Some(topic.to_string()))?;
        Some(Self {
            topic,
            style: non_blank(style),
            mood: non_blank(mood),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MultipleThumbnailsRequest {
    pub video_type: String,
    pub style: String,
    pub mood: String,
    pub placement: String,
    pub photo: ReferenceImage,
}

impl MultipleThumbnailsRequest {
    /// Missing or blank form fields fall back to their defaults.
    pub fn new(
        photo: ReferenceImage,
        video_type: Option<String>,
        style: Option<String>,
        mood: Option<String>,
        placement: Option<String>,
    ) -> Self {
        Self {
            video_type: non_blank(video_type).unwrap_or_else(|| DEFAULT_VIDEO_TYPE.to_string()),
            style: non_blank(style).unwrap_or_else(|| DEFAULT_STYLE.to_string()),
            mood: non_blank(mood).unwrap_or_else(|| DEFAULT_MOOD.to_string()),
            placement: non_blank(placement).unwrap_or_else(|| DEFAULT_PLACEMENT.to_string()),
            photo,
        }
    }

    pub fn photo_description(&self) -> String {
        photo_description(&self.video_type)
    }

    pub fn prompt_variations(&self) -> [String; VARIATION_COUNT] {
        variations(
            &self.photo_description(),
            &self.video_type,
            &self.style,
            &self.mood,
            &self.placement,
        )
    }
}

/// A single generated thumbnail: the refined prompt and where the image lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub prompt: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailResponse {
    pub success: bool,
    pub prompt: String,
    pub image_url: String,
}

impl From<Thumbnail> for ThumbnailResponse {
    fn from(thumbnail: Thumbnail) -> Self {
        Self {
            success: true,
            prompt: thumbnail.prompt,
            image_url: thumbnail.image_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailsResponse {
    pub thumbnails: Vec<String>,
}

/// How a batch of variations is sent to the image generator.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum BatchMode {
    /// All variations at once; the first failure fails the batch.
    #[default]
    Parallel,
    /// One at a time, to stay under a shared upstream rate limit.
    Sequential,
}

impl BatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchMode::Parallel => "parallel",
            BatchMode::Sequential => "sequential",
        }
    }
}

impl fmt::Display for BatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "parallel" => Ok(BatchMode::Parallel),
            "sequential" => Ok(BatchMode::Sequential),
            other => Err(format!(
                "unknown batch mode '{other}' (expected 'parallel' or 'sequential')"
            )),
        }
    }
}

/// Stand-in description used when prompting from an uploaded photo.
pub fn photo_description(video_type: &str) -> String {
    format!("Photo uploaded for {video_type} thumbnail")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
