pub mod api;
pub mod health;

use axum::Json;
use axum::http::{Request, StatusCode, Uri};
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, MakeSpan, TraceLayer};
use tracing::{Level, Span, warn};

use crate::application::errors::ErrorResponse;
use crate::application::state::AppState;

pub fn app_router(state: AppState) -> axum::Router {
    let uploads = ServeDir::new(&state.upload_dir);

    axum::Router::new()
        .route("/health", get(health::health))
        .nest("/api", api::router())
        .nest_service("/uploads", uploads)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(ThumbforgeMakeSpan)
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ErrorResponse>) {
    let path = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string);
    warn!(%path, "route not found");

    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            path: Some(path),
            ..ErrorResponse::new("Route not found")
        }),
    )
}

#[derive(Clone)]
struct ThumbforgeMakeSpan;

impl<B> MakeSpan<B> for ThumbforgeMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            version = ?request.version(),
        )
    }
}
