use axum::Json;
use axum::body::Bytes;
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::rejection::BytesRejection;
use axum::extract::{Multipart, State};
use serde::Deserialize;
use tracing::{debug, info};

use crate::application::errors::{ApiError, AppError};
use crate::application::state::AppState;
use crate::domain::images::ReferenceImage;
use crate::domain::thumbnails::{
    MultipleThumbnailsRequest, ThumbnailRequest, ThumbnailResponse, ThumbnailsResponse,
};

pub(crate) const TOPIC_REQUIRED: &str = "Topic is required";
pub(crate) const PHOTO_REQUIRED: &str = "Photo is required";
pub(crate) const SINGLE_PHOTO_ONLY: &str = "Exactly one photo must be uploaded";
pub(crate) const PHOTO_NOT_IMAGE: &str = "Photo must be an image";

const PHOTO_FIELD: &str = "photo";

/// Lenient view of the JSON body; topic presence is checked by hand.
#[derive(Debug, Default, Deserialize)]
struct ThumbnailPayload {
    topic: Option<String>,
    style: Option<String>,
    mood: Option<String>,
}

fn parse_payload(body: &[u8]) -> Result<ThumbnailPayload, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ThumbnailPayload::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::validation(format!("Invalid JSON body: {e}")))
}

#[tracing::instrument(skip(state, body))]
pub(crate) async fn create_thumbnail(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ThumbnailResponse>, ApiError> {
    let body = body.map_err(|e| {
        AppError::from_body_rejection(e.status(), e.body_text(), "Failed to read body")
    })?;
    let payload = parse_payload(&body)?;

    let request = ThumbnailRequest::new(
        payload.topic.as_deref().unwrap_or_default(),
        payload.style,
        payload.mood,
    )
    .ok_or_else(|| AppError::validation(TOPIC_REQUIRED))?;

    let thumbnail = state
        .thumbnail_service
        .create_thumbnail(&request)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to generate thumbnail"))?;

    Ok(Json(thumbnail.into()))
}

#[derive(Debug, Default)]
struct UploadForm {
    photo: Option<ReferenceImage>,
    video_type: Option<String>,
    style: Option<String>,
    mood: Option<String>,
    placement: Option<String>,
}

fn multipart_error(err: MultipartError, context: &str) -> AppError {
    AppError::from_body_rejection(err.status(), err.body_text(), context)
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Invalid multipart body"))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            PHOTO_FIELD => {
                if form.photo.is_some() {
                    return Err(AppError::validation(SINGLE_PHOTO_ONLY));
                }
                form.photo = read_photo(field).await?;
            }
            "videoType" => form.video_type = Some(read_text(field).await?),
            "style" => form.style = Some(read_text(field).await?),
            "mood" => form.mood = Some(read_text(field).await?),
            "placement" => form.placement = Some(read_text(field).await?),
            other => debug!(field = other, "ignoring unknown form field"),
        }
    }

    Ok(form)
}

async fn read_photo(field: Field<'_>) -> Result<Option<ReferenceImage>, AppError> {
    let mime_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_default();
    if !mime_type.starts_with("image/") {
        return Err(AppError::validation(PHOTO_NOT_IMAGE));
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| multipart_error(e, "Failed to read photo"))?;
    if data.is_empty() {
        return Ok(None);
    }

    Ok(Some(ReferenceImage::new(data.to_vec(), mime_type)))
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| multipart_error(e, "Invalid form field"))
}

#[tracing::instrument(skip(state, multipart))]
pub(crate) async fn create_thumbnails(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ThumbnailsResponse>, ApiError> {
    let mut multipart = multipart.map_err(|_| AppError::validation(PHOTO_REQUIRED))?;
    let form = read_form(&mut multipart).await?;
    let photo = form
        .photo
        .ok_or_else(|| AppError::validation(PHOTO_REQUIRED))?;

    info!(
        bytes = photo.data.len(),
        mime_type = %photo.mime_type,
        "photo received"
    );

    let request = MultipleThumbnailsRequest::new(
        photo,
        form.video_type,
        form.style,
        form.mood,
        form.placement,
    );

    let thumbnails = state
        .thumbnail_service
        .create_batch(request)
        .await
        .map_err(|e| ApiError::from(e).context("Failed to generate thumbnails"))?;

    Ok(Json(ThumbnailsResponse { thumbnails }))
}
