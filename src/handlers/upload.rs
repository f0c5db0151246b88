use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, Path, Request, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Json, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::{
    dto::upload::{DeleteFileResponse, EndpointListResponse, FileUploadResponse, MessageResponse, UploadForm},
    error::UploadError,
    AppState,
};

pub const ADVERTISED_ENDPOINTS: [&str; 3] = ["/api/upload", "/api/download", "/api/delete"];

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Available endpoints", body = EndpointListResponse)
    ),
    tag = "upload"
)]
pub async fn index() -> Json<EndpointListResponse> {
    Json(EndpointListResponse {
        message: "Path List".to_string(),
        endpoints: ADVERTISED_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    })
}

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data", description = "Single image in the `file` field"),
    responses(
        (status = 200, description = "File uploaded successfully", body = FileUploadResponse),
        (status = 400, description = "Rejected upload", body = MessageResponse),
        (status = 500, description = "Internal server error", body = MessageResponse)
    ),
    tag = "upload"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FileUploadResponse>, UploadError> {
    tracing::info!("File upload request received");
    let mut multipart = multipart.map_err(UploadError::from_rejection)?;

    let file = state.upload_service.process(&mut multipart).await?;
    tracing::info!("Stored {} ({} bytes)", file.name, file.size);

    Ok(Json(FileUploadResponse {
        message: "File uploaded successfully".to_string(),
        file,
    }))
}

#[utoipa::path(
    get,
    path = "/api/download/{name}",
    params(
        ("name" = String, Path, description = "Stored file name returned by the upload endpoint")
    ),
    responses(
        (status = 200, description = "File contents as an attachment"),
        (status = 400, description = "Invalid file name", body = MessageResponse),
        (status = 404, description = "File not found", body = MessageResponse)
    ),
    tag = "upload"
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
    request: Request,
) -> Result<Response, UploadError> {
    let path = state.upload_service.resolve(&name).await?;
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", name))
        .map_err(|_| UploadError::InvalidFileName(name.clone()))?;

    let mut response = ServeFile::new(&path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {})
        .map(Body::new);

    if response.status().is_success() {
        response.headers_mut().insert(header::CONTENT_DISPOSITION, disposition);
    }
    Ok(response.into_response())
}

#[utoipa::path(
    delete,
    path = "/api/delete/{name}",
    params(
        ("name" = String, Path, description = "Stored file name returned by the upload endpoint")
    ),
    responses(
        (status = 200, description = "File deleted successfully", body = DeleteFileResponse),
        (status = 400, description = "Invalid file name", body = MessageResponse),
        (status = 404, description = "File not found", body = MessageResponse),
        (status = 500, description = "Internal server error", body = MessageResponse)
    ),
    tag = "upload"
)]
pub async fn delete_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DeleteFileResponse>, UploadError> {
    state.upload_service.delete(&name).await?;

    Ok(Json(DeleteFileResponse {
        message: "File deleted successfully".to_string(),
        name,
    }))
}
