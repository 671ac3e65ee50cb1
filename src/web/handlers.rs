use crate::{
    classify::ClassificationOutcome,
    image::ImageLoader,
    utils::error::ClassifierError,
    web::{
        extractors::{RequestId, ValidatedJson},
        AppState,
    },
    Result,
};
use axum::{
    extract::{Multipart, State},
    response::Json,
};
use image::GenericImageView;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// JSON请求体（base64模式）
#[derive(Debug, Deserialize)]
pub struct ImageJsonRequest {
    /// Base64编码的图像数据，可带数据URL前缀
    pub image: String,
}

/// JSON响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }
}

/// 选中图片的基本信息
#[derive(Debug, Serialize)]
pub struct SelectedImage {
    pub width: u32,
    pub height: u32,
}

/// JSON base64上传并分类
pub async fn classify_json_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<ImageJsonRequest>,
) -> Result<Json<ApiResponse<ClassificationOutcome>>> {
    let start_time = Instant::now();
    tracing::info!("Processing JSON classification request: request_id={}", request_id);

    let image = ImageLoader::from_base64(&request.image)?;
    let outcome = state.session.classify_image(image).await?;

    tracing::info!(
        "JSON classification completed: request_id={}, class={}, time={:.3}s",
        request_id,
        outcome.predicted_class,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(outcome, request_id)))
}

/// Multipart文件上传并分类
pub async fn classify_upload_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ClassificationOutcome>>> {
    let start_time = Instant::now();
    tracing::info!("Processing multipart classification request: request_id={}", request_id);

    let mut image_data: Option<axum::body::Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ClassifierError::InvalidInput(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or("unknown").to_string();

        if field_name != "file" {
            tracing::debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        if let Some(content_type) = field.content_type() {
            if !content_type.starts_with("image/") {
                return Err(ClassifierError::UnsupportedFormat(content_type.to_string()));
            }
        }

        let data = field.bytes().await.map_err(|e| {
            ClassifierError::InvalidInput(format!("Failed to read file data: {}", e))
        })?;

        if data.is_empty() {
            return Err(ClassifierError::InvalidInput("Empty file".to_string()));
        }

        tracing::debug!("Received file: {} bytes", data.len());
        image_data = Some(data);
    }

    let image_data = image_data
        .ok_or_else(|| ClassifierError::InvalidInput("No image file provided".to_string()))?;

    let image = ImageLoader::from_bytes(&image_data)?;
    let outcome = state.session.classify_image(image).await?;

    tracing::info!(
        "Upload classification completed: request_id={}, class={}, time={:.3}s",
        request_id,
        outcome.predicted_class,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(outcome, request_id)))
}

/// 对已选中的图片分类
pub async fn classify_current_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
) -> Result<Json<ApiResponse<ClassificationOutcome>>> {
    let outcome = state.session.classify().await?;
    Ok(Json(ApiResponse::success(outcome, request_id)))
}

/// 选中图片（替换之前的选择）
pub async fn select_image_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<ImageJsonRequest>,
) -> Result<Json<ApiResponse<SelectedImage>>> {
    let image = ImageLoader::from_base64(&request.image)?;
    let (width, height) = image.dimensions();

    state.session.select_image(image);

    Ok(Json(ApiResponse::success(
        SelectedImage { width, height },
        request_id,
    )))
}

/// 清除已选中的图片
pub async fn clear_image_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
) -> Json<ApiResponse<bool>> {
    let had_image = state.session.has_image();
    state.session.clear_image();
    Json(ApiResponse::success(had_image, request_id))
}
