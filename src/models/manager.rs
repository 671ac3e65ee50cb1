use crate::classify::CLASS_NAMES;
use crate::models::OnnxClassifier;
use crate::utils::error::ClassifierError;
use crate::{Config, Result};
use std::sync::Arc;

/// 模型管理器，持有已加载的分类模型
pub struct ModelManager {
    classifier: Arc<OnnxClassifier>,
    config: Config,
}

impl ModelManager {
    /// 加载模型
    pub fn load(config: Config) -> Result<Self> {
        tracing::info!("Initializing model manager...");

        let classifier = Arc::new(OnnxClassifier::new(&config)?);

        tracing::info!("Model manager initialized successfully");
        Ok(Self { classifier, config })
    }

    /// 获取分类器引用
    pub fn classifier(&self) -> Arc<OnnxClassifier> {
        Arc::clone(&self.classifier)
    }

    /// 模型健康检查
    pub fn health_check(&self) -> Result<()> {
        let path = self.classifier.model_path();
        if !path.exists() {
            return Err(ClassifierError::ModelLoad(format!(
                "Model file disappeared: {}",
                path.display()
            )));
        }

        tracing::debug!("Model health check passed");
        Ok(())
    }

    /// 获取模型统计信息
    pub fn get_stats(&self) -> ModelStats {
        ModelStats {
            model_path: self.classifier.model_path().display().to_string(),
            input_name: self.classifier.input_name().to_string(),
            output_name: self.classifier.output_name().to_string(),
            num_classes: CLASS_NAMES.len(),
            intra_threads: self.config.onnx_config.intra_threads,
            optimization_level: self.config.onnx_config.optimization_level,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub model_path: String,
    pub input_name: String,
    pub output_name: String,
    pub num_classes: usize,
    pub intra_threads: usize,
    pub optimization_level: i32,
}
