use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use stencil_shared::constants::TEMPLATES_PATH;
use stencil_store::StoreError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use self::extract::Path;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::media_store::MediaStore;
use crate::worker::WorkerHandle;
use crate::SharedDb;

mod extract;
mod jobs;
mod library;
mod uploads;

/// Room for multipart framing and text fields on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: SharedDb,
    pub media: Arc<MediaStore>,
    pub worker: WorkerHandle,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = if state.config.cors_allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let templates = Router::new()
        .route("/uploads/", get(uploads::list_uploads).post(uploads::create_upload))
        .route(
            "/uploads/{id}/",
            get(uploads::get_upload).delete(uploads::delete_upload),
        )
        .route("/jobs/", get(jobs::list_jobs).post(jobs::create_job))
        .route("/jobs/{id}/", get(jobs::get_job))
        .route("/library/", get(library::list_library).post(library::add_to_library))
        .route(
            "/library/{id}/",
            get(library::get_library_item).delete(library::delete_library_item),
        )
        .route("/library/{id}/download/", get(library::download_library_item))
        .route("/healthz/", get(healthz));

    let body_limit = state.config.max_upload_size + MULTIPART_OVERHEAD;

    Router::new()
        .nest(&format!("/api{TEMPLATES_PATH}"), templates)
        .route("/media/{*path}", get(media_file))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn media_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let data = state.media.read(&path).await?;
    Ok(([(header::CONTENT_TYPE, content_type(&path))], data))
}

fn content_type(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Replace a store-level miss with a resource-specific 404 message.
fn not_found(message: &'static str) -> impl Fn(ServerError) -> ServerError {
    move |e| match e {
        ServerError::Store(StoreError::NotFound) => ServerError::NotFound(message.to_string()),
        other => other,
    }
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
