#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use image_upload_server::{config::AppConfig, create_router, AppState, IdGenerator, SequentialId};
use std::sync::Arc;
use tempfile::TempDir;

pub const BOUNDARY: &str = "------------------------3f9c2b7e1d4a";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    /// Destination directory; removed when the app is dropped.
    pub dir: TempDir,
}

impl TestApp {
    /// Names of everything currently in the destination directory, sorted.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .expect("Failed to read upload directory")
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        use tower::ServiceExt;
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(Arc::new(SequentialId::new("test")))
}

pub fn setup_test_app_with(id_generator: Arc<dyn IdGenerator>) -> TestApp {
    let dir = TempDir::new().expect("Failed to create upload directory");

    let mut config = AppConfig::default();
    config.upload.dest_dir = format!("{}/", dir.path().display());
    let config = Arc::new(config);

    let state = AppState::new(config, id_generator);
    let router = create_router(state.clone());

    TestApp { router, state, dir }
}

pub enum Part<'a> {
    File {
        field: &'a str,
        filename: &'a str,
        data: &'a [u8],
    },
    Text {
        field: &'a str,
        value: &'a str,
    },
}

pub fn file<'a>(filename: &'a str, data: &'a [u8]) -> Part<'a> {
    Part::File {
        field: "file",
        filename,
        data,
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File { field, filename, data } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        field, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { field, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}", field, value)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

pub async fn json_body(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
