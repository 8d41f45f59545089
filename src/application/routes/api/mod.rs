pub(crate) mod thumbnails;

use axum::extract::DefaultBodyLimit;
use axum::routing::post;

use crate::application::state::AppState;

/// 10 MiB, covering photo uploads.
pub(crate) const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub(super) fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/thumbnail", post(thumbnails::create_thumbnail))
        .route("/thumbnails", post(thumbnails::create_thumbnails))
        .route("/generate-thumbnails", post(thumbnails::create_thumbnails))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES))
}
