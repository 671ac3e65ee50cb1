use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Model is still loading, please wait")]
    ModelNotLoaded,

    #[error("No image selected")]
    NoImageSelected,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Shape mismatch: expected {expected} probabilities, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("A classification request is already in flight")]
    Busy,

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ClassifierError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClassifierError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ClassifierError::ShapeMismatch { .. } => StatusCode::BAD_REQUEST,
            ClassifierError::NoImageSelected => StatusCode::BAD_REQUEST,
            ClassifierError::Base64(_) => StatusCode::BAD_REQUEST,
            ClassifierError::Json(_) => StatusCode::BAD_REQUEST,
            ClassifierError::ImageDecode(_) => StatusCode::BAD_REQUEST,
            ClassifierError::Busy => StatusCode::CONFLICT,
            ClassifierError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            ClassifierError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ClassifierError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            ClassifierError::ModelNotLoaded => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ClassifierError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            ClassifierError::ModelNotLoaded => "MODEL_NOT_LOADED",
            ClassifierError::NoImageSelected => "NO_IMAGE_SELECTED",
            ClassifierError::InvalidInput(_) => "INVALID_INPUT",
            ClassifierError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            ClassifierError::Inference(_) => "INFERENCE_ERROR",
            ClassifierError::Busy => "BUSY",
            ClassifierError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            ClassifierError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            ClassifierError::Config(_) => "CONFIG_ERROR",
            ClassifierError::Io(_) => "IO_ERROR",
            ClassifierError::Json(_) => "JSON_ERROR",
            ClassifierError::Base64(_) => "BASE64_DECODE_ERROR",
            ClassifierError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            ClassifierError::Ort(_) => "ORT_ERROR",
            ClassifierError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ClassifierError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        if status.is_server_error() {
            tracing::error!("Request failed: {} ({})", self, status);
        } else {
            tracing::warn!("Request rejected: {} ({})", self, status);
        }

        (status, axum::Json(error_response)).into_response()
    }
}
