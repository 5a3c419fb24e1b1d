//! Submission of a normalized board image to the prediction service.
//!
//! ## Wire contract
//!
//! ```text
//! POST <endpoint>                      (e.g. http://host:8000/predict)
//! Content-Type: multipart/form-data
//!   file = chessboard.jpg (image/jpeg)
//!
//! 2xx  {"fen": "<non-empty string>"}   → FenResult
//! 2xx  anything else                   → InvalidServerResponse
//! non-2xx, transport error             → NetworkFailure
//! ```
//!
//! One attempt per call: no retry, no timeout. Keeping a single submission
//! in flight is the state machine's job, not the client's.

use crate::error::{ErrorInfo, ErrorKind};
use crate::types::{FenResult, NormalizedImage};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

/// Multipart field carrying the image.
pub const FORM_FIELD: &str = "file";
/// Filename sent with the image part.
pub const UPLOAD_FILENAME: &str = "chessboard.jpg";

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service responded with HTTP {0}")]
    Status(StatusCode),
    #[error("response body is not JSON: {0}")]
    MalformedBody(String),
    #[error("response has no non-empty \"fen\" field")]
    MissingFen,
}

impl SubmitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubmitError::Transport(_) | SubmitError::Status(_) => ErrorKind::NetworkFailure,
            SubmitError::MalformedBody(_) | SubmitError::MissingFen => {
                ErrorKind::InvalidServerResponse
            }
        }
    }
}

impl From<SubmitError> for ErrorInfo {
    fn from(err: SubmitError) -> Self {
        ErrorInfo::new(err.kind(), err.to_string())
    }
}

/// Something that turns a board image into a position.
#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn predict(&self, image: NormalizedImage) -> Result<FenResult, SubmitError>;
}

/// HTTP client for the prediction endpoint.
pub struct HttpPredictionClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpPredictionClient {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl PredictionService for HttpPredictionClient {
    async fn predict(&self, image: NormalizedImage) -> Result<FenResult, SubmitError> {
        let bytes = image.bytes().len();
        let part = Part::bytes(image.into_bytes())
            .file_name(UPLOAD_FILENAME)
            .mime_str(NormalizedImage::CONTENT_TYPE)?;
        let form = Form::new().part(FORM_FIELD, part);

        info!(endpoint = %self.endpoint, bytes, "submitting board image");
        let resp = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| warn!(error = %e, "prediction request failed"))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, "prediction service rejected the request");
            return Err(SubmitError::Status(status));
        }
        let body = resp.bytes().await?;
        let result = classify_response(status, &body);
        match &result {
            Ok(fen) => info!(%fen, "position recognized"),
            Err(e) => warn!(error = %e, "unusable prediction response"),
        }
        result
    }
}

/// Classify a prediction response from its status and body.
pub fn classify_response(status: StatusCode, body: &[u8]) -> Result<FenResult, SubmitError> {
    if !status.is_success() {
        return Err(SubmitError::Status(status));
    }
    let value: Value =
        serde_json::from_slice(body).map_err(|e| SubmitError::MalformedBody(e.to_string()))?;
    value
        .get("fen")
        .and_then(Value::as_str)
        .and_then(|fen| FenResult::new(fen).ok())
        .ok_or(SubmitError::MissingFen)
}
