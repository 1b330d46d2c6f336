use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderMap};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::config::HttpConfig;
use crate::detection::{label_frame, CategoryTable, Detector};

use super::error::UploadError;

const IMAGE_FIELD: &str = "image";

#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<dyn Detector>,
    pub categories: Arc<CategoryTable>,
}

impl AppState {
    pub fn new(detector: Arc<dyn Detector>, categories: CategoryTable) -> Self {
        Self {
            detector,
            categories: Arc::new(categories),
        }
    }
}

#[derive(Serialize)]
struct LabelsResponse {
    labels: Vec<String>,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/upload", post(upload_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(state: AppState, config: &HttpConfig) -> Result<(), std::io::Error> {
    let app = router(state, config.max_upload_bytes);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

async fn upload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<LabelsResponse>, UploadError> {
    // Without a content type there is no form to look in; any other
    // unparseable body is a processing failure.
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(_) if !headers.contains_key(header::CONTENT_TYPE) => {
            return Err(UploadError::MissingImage)
        }
        Err(rejection) => return Err(rejection.into()),
    };

    let bytes = read_image_field(&mut multipart).await?;

    let detector = Arc::clone(&state.detector);
    let categories = Arc::clone(&state.categories);
    let labels = tokio::task::spawn_blocking(move || {
        label_frame(detector.as_ref(), &categories, &bytes)
    })
    .await??;

    Ok(Json(LabelsResponse { labels }))
}

async fn read_image_field(multipart: &mut Multipart) -> Result<Bytes, UploadError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            return Ok(field.bytes().await?);
        }
    }
    Err(UploadError::MissingImage)
}
