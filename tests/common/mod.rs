//! In-process prediction service and fixtures shared by integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use fen_capture::crop::{CropOptions, CropSession, OutputSpec, RustCropEngine};
use fen_capture::types::{CapturedFrame, NormalizedImage};
use image::{DynamicImage, ImageFormat, RgbImage};
use reqwest::Url;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One multipart part as the service received it.
#[derive(Debug, Clone)]
pub struct Upload {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
struct ServiceState {
    status: StatusCode,
    body: String,
    uploads: Arc<Mutex<Vec<Upload>>>,
}

/// A running mock of the recognition service's `/predict` route.
pub struct MockService {
    pub endpoint: Url,
    uploads: Arc<Mutex<Vec<Upload>>>,
}

impl MockService {
    /// Serve `POST /predict`, answering every request with `status` and `body`.
    pub async fn start(status: StatusCode, body: &str) -> Self {
        let uploads = Arc::new(Mutex::new(Vec::new()));
        let state = ServiceState {
            status,
            body: body.to_string(),
            uploads: uploads.clone(),
        };
        let app = Router::new()
            .route("/predict", post(predict))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            endpoint: Url::parse(&format!("http://{addr}/predict")).unwrap(),
            uploads,
        }
    }

    pub async fn replying_fen(fen: &str) -> Self {
        let body = serde_json::json!({ "fen": fen }).to_string();
        Self::start(StatusCode::OK, &body).await
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

async fn predict(State(state): State<ServiceState>, mut multipart: Multipart) -> (StatusCode, String) {
    while let Ok(Some(field)) = multipart.next_field().await {
        let upload = Upload {
            field: field.name().unwrap_or_default().to_string(),
            file_name: field.file_name().map(str::to_string),
            content_type: field.content_type().map(str::to_string),
            bytes: field.bytes().await.map(|b| b.to_vec()).unwrap_or_default(),
        };
        state.uploads.lock().unwrap().push(upload);
    }
    (state.status, state.body.clone())
}

/// An endpoint nothing is listening on.
pub async fn dead_endpoint() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}/predict")).unwrap()
}

// =========================================================================
// Images
// =========================================================================

/// An 8×8 checkerboard.
pub fn board_image(width: u32, height: u32) -> DynamicImage {
    let cell_w = (width / 8).max(1);
    let cell_h = (height / 8).max(1);
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        if ((x / cell_w) + (y / cell_h)) % 2 == 0 {
            image::Rgb([238, 238, 210])
        } else {
            image::Rgb([118, 150, 86])
        }
    }))
}

/// Write a board photo as JPEG into `dir`.
pub fn write_board_photo(dir: &Path, width: u32, height: u32) -> PathBuf {
    let path = dir.join("board.jpg");
    board_image(width, height)
        .save_with_format(&path, ImageFormat::Jpeg)
        .unwrap();
    path
}

/// A finalized upload image, produced the same way the capture flow does.
pub fn normalized_board() -> NormalizedImage {
    let mut png = Cursor::new(Vec::new());
    board_image(640, 480)
        .write_to(&mut png, ImageFormat::Png)
        .unwrap();
    let frame = CapturedFrame::new(png.into_inner(), 640, 480);
    let session = CropSession::open(&RustCropEngine::new(), &frame, &CropOptions::default()).unwrap();
    session.finalize(&OutputSpec::default()).unwrap()
}
