use serde::Serialize;

/// 模型输出的类别，顺序与模型输出下标一致
pub const CLASS_NAMES: [&str; 4] = ["Acne", "Eczema", "Tinea", "Warts"];

/// 各类别的展示颜色，与 `CLASS_NAMES` 一一对应
pub const CLASS_COLORS: [&str; 4] = ["#ff6b6b", "#4ecdc4", "#45b7d1", "#96ceb4"];

/// 分类请求所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifyStage {
    Idle,
    Preprocessing,
    Inferring,
    Ranking,
}

/// 分类处理状态
#[derive(Debug, Clone)]
pub struct ClassifyStatus {
    /// 当前处理阶段
    pub stage: ClassifyStage,
    /// 进度百分比 (0.0 - 1.0)
    pub progress: f32,
    /// 状态消息
    pub message: String,
}

impl ClassifyStatus {
    pub fn new(stage: ClassifyStage, progress: f32, message: &str) -> Self {
        Self {
            stage,
            progress,
            message: message.to_string(),
        }
    }
}

// 重新导出主要类型
pub use crate::image::postprocessing::{ClassificationOutcome, RankedResult};
