pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod ui;

use crate::{
    classify::{ClassificationSession, ClassifyStatus, CLASS_NAMES},
    models::ModelManager,
    utils::{error::ClassifierError, TensorTracker},
    Config, Result,
};
use axum::{
    extract::{DefaultBodyLimit, State},
    middleware::from_fn,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use parking_lot::RwLock;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session: Arc<ClassificationSession>,
    pub models: Arc<RwLock<Option<Arc<ModelManager>>>>,
}

impl AppState {
    pub fn new(config: Config, session: ClassificationSession) -> Self {
        Self {
            config,
            session: Arc::new(session),
            models: Arc::new(RwLock::new(None)),
        }
    }

    /// 模型加载完成后挂载到会话
    pub fn attach_models(&self, manager: ModelManager) {
        self.session.set_model(manager.classifier());
        *self.models.write() = Some(Arc::new(manager));
    }

    pub fn models(&self) -> Option<Arc<ModelManager>> {
        self.models.read().clone()
    }
}

pub async fn serve(config: Config) -> Result<()> {
    let session = build_session(&config);
    let state = AppState::new(config.clone(), session);

    // 后台加载模型，加载完成前的请求返回 MODEL_NOT_LOADED
    spawn_model_loader(state.clone());

    let app = create_app(state);

    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        ClassifierError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST   /classify          - JSON base64 upload");
    tracing::info!("  POST   /classify/upload   - Multipart file upload");
    tracing::info!("  POST   /classify/current  - Classify the selected image");
    tracing::info!("  POST   /image             - Select image (JSON base64)");
    tracing::info!("  DELETE /image             - Clear selected image");
    tracing::info!("  GET    /                  - Web UI");
    tracing::info!("  GET    /health            - Health check");
    tracing::info!("  GET    /api/info          - Service information");

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        ClassifierError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ClassifierError::Internal(format!("Server failed to start: {}", e)))?;

    Ok(())
}

fn build_session(config: &Config) -> ClassificationSession {
    let session = ClassificationSession::new(TensorTracker::new());
    if !config.dev_mode {
        return session;
    }

    // 开发模式下记录每个阶段的进度
    let (status_tx, mut status_rx) = mpsc::unbounded_channel::<ClassifyStatus>();
    tokio::spawn(async move {
        while let Some(status) = status_rx.recv().await {
            tracing::debug!(
                "Classification progress: {:?} - {:.1}% - {}",
                status.stage,
                status.progress * 100.0,
                status.message
            );
        }
    });

    session.with_status_channel(status_tx)
}

fn spawn_model_loader(state: AppState) {
    tokio::spawn(async move {
        let config = state.config.clone();
        match tokio::task::spawn_blocking(move || ModelManager::load(config)).await {
            Ok(Ok(manager)) => state.attach_models(manager),
            Ok(Err(e)) => tracing::error!("Failed to load classification model: {}", e),
            Err(e) => tracing::error!("Model loading task failed: {}", e),
        }
    });
}

pub fn create_app(state: AppState) -> Router {
    let server_config = &state.config.server_config;

    Router::new()
        // 分类API路由
        .route("/classify", post(handlers::classify_json_handler))
        .route("/classify/upload", post(handlers::classify_upload_handler))
        .route("/classify/current", post(handlers::classify_current_handler))
        .route("/image", post(handlers::select_image_handler))
        .route("/image", delete(handlers::clear_image_handler))
        // Web UI路由
        .route("/", get(ui::index_handler))
        // 系统路由
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        .layer(from_fn(middleware::security_headers))
        .layer(from_fn(middleware::request_logging))
        .layer(DefaultBodyLimit::max(server_config.max_request_size))
        .layer(RequestBodyLimitLayer::new(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        // 所有路由共享同一个并发上限
        .layer(GlobalConcurrencyLimitLayer::new(server_config.max_connections))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 健康检查端点
async fn health_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    if !state.session.has_model() {
        return Err(ClassifierError::ModelNotLoaded);
    }
    if let Some(models) = state.models() {
        models.health_check()?;
    }

    Ok(Json(json!({
        "status": "healthy",
        "busy": state.session.is_busy(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// 服务信息端点
async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.models().map(|m| m.get_stats());

    Json(json!({
        "service": "Skin Condition Classifier",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "classes": CLASS_NAMES,
        "model_loaded": state.session.has_model(),
        "model": stats,
        "stage": state.session.stage(),
    }))
}
