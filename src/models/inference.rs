use crate::image::InputTensor;
use crate::utils::error::ClassifierError;
use crate::Result;
use async_trait::async_trait;

/// 模型推理服务
///
/// 输入为预处理后的 [1, 224, 224, 3] 张量，输出与类别列表按下标对齐的概率向量。
#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn predict(&self, tensor: &InputTensor) -> Result<Vec<f32>>;
}

/// 在阻塞线程池上执行推理，异步运行时线程在等待期间继续处理其他请求
pub async fn run_blocking<F, T>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ClassifierError::Inference(format!("Inference task join error: {}", e)))?
}
