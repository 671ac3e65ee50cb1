use crate::{
    classify::{ClassificationOutcome, ClassifyStage, ClassifyStatus},
    image::{ImagePreprocessor, ResultRanker},
    models::InferenceService,
    utils::{error::ClassifierError, TensorTracker},
    Result,
};
use image::DynamicImage;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// 分类会话：持有当前模型与当前图片，驱动单次分类请求
///
/// 同一时刻只允许一个分类请求，重叠的请求直接以 [`ClassifierError::Busy`] 拒绝。
pub struct ClassificationSession {
    model: RwLock<Option<Arc<dyn InferenceService>>>,
    current_image: Mutex<Option<Arc<DynamicImage>>>,
    stage: Mutex<ClassifyStage>,
    in_flight: AtomicBool,
    preprocessor: ImagePreprocessor,
    status_tx: Option<mpsc::UnboundedSender<ClassifyStatus>>,
}

impl Default for ClassificationSession {
    fn default() -> Self {
        Self::new(TensorTracker::new())
    }
}

impl ClassificationSession {
    pub fn new(tracker: TensorTracker) -> Self {
        Self {
            model: RwLock::new(None),
            current_image: Mutex::new(None),
            stage: Mutex::new(ClassifyStage::Idle),
            in_flight: AtomicBool::new(false),
            preprocessor: ImagePreprocessor::new(tracker),
            status_tx: None,
        }
    }

    /// 附加进度通道
    pub fn with_status_channel(mut self, tx: mpsc::UnboundedSender<ClassifyStatus>) -> Self {
        self.status_tx = Some(tx);
        self
    }

    pub fn tracker(&self) -> &TensorTracker {
        self.preprocessor.tracker()
    }

    pub fn set_model(&self, model: Arc<dyn InferenceService>) {
        *self.model.write() = Some(model);
        tracing::info!("Classification model attached to session");
    }

    pub fn has_model(&self) -> bool {
        self.model.read().is_some()
    }

    /// 替换当前选中的图片
    pub fn select_image(&self, image: DynamicImage) {
        tracing::debug!("Image selected: {}x{}", image.width(), image.height());
        *self.current_image.lock() = Some(Arc::new(image));
    }

    pub fn clear_image(&self) {
        *self.current_image.lock() = None;
        tracing::debug!("Image cleared");
    }

    pub fn has_image(&self) -> bool {
        self.current_image.lock().is_some()
    }

    pub fn stage(&self) -> ClassifyStage {
        *self.stage.lock()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 对当前选中的图片分类
    pub async fn classify(&self) -> Result<ClassificationOutcome> {
        let _guard = self.begin()?;
        self.run().await
    }

    /// 选中图片并立即分类
    pub async fn classify_image(&self, image: DynamicImage) -> Result<ClassificationOutcome> {
        let _guard = self.begin()?;
        self.select_image(image);
        self.run().await
    }

    fn begin(&self) -> Result<InFlightGuard<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("Rejecting classification request: another request is in flight");
            return Err(ClassifierError::Busy);
        }

        Ok(InFlightGuard { session: self })
    }

    async fn run(&self) -> Result<ClassificationOutcome> {
        let model = self
            .model
            .read()
            .clone()
            .ok_or(ClassifierError::ModelNotLoaded)?;
        let image = self
            .current_image
            .lock()
            .clone()
            .ok_or(ClassifierError::NoImageSelected)?;

        let start_time = Instant::now();

        self.enter(ClassifyStage::Preprocessing, 0.1, "Preprocessing image");
        let preprocessor = self.preprocessor.clone();
        let tensor = tokio::task::spawn_blocking(move || preprocessor.preprocess(&image))
            .await
            .map_err(|e| {
                ClassifierError::Internal(format!("Preprocessing task join error: {}", e))
            })??;

        self.enter(ClassifyStage::Inferring, 0.4, "Running model inference");
        let probabilities = model.predict(&tensor).await?;
        drop(tensor);

        self.enter(ClassifyStage::Ranking, 0.9, "Ranking class probabilities");
        let outcome = ResultRanker::rank(&probabilities)?;

        tracing::info!(
            "Classification completed: class={}, confidence={}%, time={:.3}s",
            outcome.predicted_class,
            outcome.confidence_percentage,
            start_time.elapsed().as_secs_f32()
        );

        Ok(outcome)
    }

    fn enter(&self, stage: ClassifyStage, progress: f32, message: &str) {
        *self.stage.lock() = stage;
        if let Some(ref tx) = self.status_tx {
            let _ = tx.send(ClassifyStatus::new(stage, progress, message));
        }
    }
}

/// 请求结束（无论成功或失败）时回到空闲状态
struct InFlightGuard<'a> {
    session: &'a ClassificationSession,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        *self.session.stage.lock() = ClassifyStage::Idle;
        self.session.in_flight.store(false, Ordering::SeqCst);
    }
}
