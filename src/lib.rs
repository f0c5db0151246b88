pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::AppConfig;
pub use error::UploadError;
pub use services::id::{IdGenerator, RandomId, SequentialId};
pub use services::upload::UploadService;

/// Room left in the request body limit for multipart boundaries, part
/// headers and small form fields next to a maximum-size file.
pub const MULTIPART_OVERHEAD: u64 = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub upload_service: Arc<UploadService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, id_generator: Arc<dyn IdGenerator>) -> Self {
        Self {
            upload_service: Arc::new(UploadService::new(&config.upload, id_generator)),
            config,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::upload::index,
        handlers::upload::upload_file,
        handlers::upload::download_file,
        handlers::upload::delete_file,
    ),
    components(schemas(
        dto::upload::MessageResponse,
        dto::upload::EndpointListResponse,
        dto::upload::FileUploadResponse,
        dto::upload::UploadedFile,
        dto::upload::UploadForm,
        dto::upload::DeleteFileResponse
    )),
    tags(
        (name = "upload", description = "Image upload API")
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    let upload = &state.config.upload;
    let body_limit = usize::try_from(upload.max_file_size.saturating_add(MULTIPART_OVERHEAD))
        .unwrap_or(usize::MAX);

    let api_routes = Router::new()
        .route("/", get(handlers::upload::index))
        .route(
            "/api/upload",
            post(handlers::upload::upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/download/:name", get(handlers::upload::download_file))
        .route("/api/delete/:name", delete(handlers::upload::delete_file));

    // Previously uploaded files, served as-is
    let static_routes = Router::new().nest_service(
        upload.public_path.trim_end_matches('/'),
        ServeDir::new(&upload.dest_dir),
    );

    let api_docs_routes = Router::new()
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    Router::new()
        .merge(api_routes)
        .merge(static_routes)
        .merge(api_docs_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
