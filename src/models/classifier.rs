use crate::image::InputTensor;
use crate::models::{run_blocking, InferenceService};
use crate::utils::error::ClassifierError;
use crate::{Config, Result};
use async_trait::async_trait;
use ndarray::Array4;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// ONNX皮肤病分类模型
pub struct OnnxClassifier {
    session: Arc<Mutex<Session>>,
    input_name: String,  // 动态发现的输入名称
    output_name: String, // 动态发现的输出名称
    model_path: PathBuf,
}

impl OnnxClassifier {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path = config.model_path.clone();

        if !model_path.exists() {
            return Err(ClassifierError::ModelLoad(format!(
                "Classification model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let session = Session::builder()?
            .with_optimization_level(optimization_level(config.onnx_config.optimization_level))?
            .with_intra_threads(config.onnx_config.intra_threads)?
            .commit_from_file(&model_path)?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(ClassifierError::ModelLoad(
                    "Classification model has no inputs".to_string(),
                ))
            }
        };

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(ClassifierError::ModelLoad(
                    "Classification model has no outputs".to_string(),
                ))
            }
        };

        tracing::info!(
            "Classification model loaded: input='{}', output='{}'",
            input_name,
            output_name
        );
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Classification output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_name,
            model_path,
        })
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

#[async_trait]
impl InferenceService for OnnxClassifier {
    async fn predict(&self, tensor: &InputTensor) -> Result<Vec<f32>> {
        let session = Arc::clone(&self.session);
        let input_name = self.input_name.clone();
        let output_name = self.output_name.clone();
        let input = tensor.array().clone();

        run_blocking(move || run_session(&session, &input_name, &output_name, input)).await
    }
}

/// 同步推理，返回展平后的概率向量
fn run_session(
    session: &Mutex<Session>,
    input_name: &str,
    output_name: &str,
    input: Array4<f32>,
) -> Result<Vec<f32>> {
    let input = Tensor::from_array(input).map_err(inference_error)?;

    let probabilities = {
        let mut session = session.lock();
        let outputs = session
            .run(inputs![input_name => input])
            .map_err(inference_error)?;

        match outputs.get(output_name) {
            Some(output) => output
                .try_extract_array::<f32>()
                .map_err(inference_error)?
                .iter()
                .copied()
                .collect::<Vec<f32>>(),
            None => {
                let available_outputs: Vec<String> =
                    outputs.keys().map(|s| s.to_string()).collect();
                return Err(ClassifierError::Inference(format!(
                    "Classification output '{}' not found. Available outputs: {:?}",
                    output_name, available_outputs
                )));
            }
        }
    };

    tracing::debug!("Raw predictions: {:?}", probabilities);

    Ok(probabilities)
}

fn inference_error(e: ort::Error) -> ClassifierError {
    ClassifierError::Inference(e.to_string())
}

fn optimization_level(level: i32) -> GraphOptimizationLevel {
    match level {
        i32::MIN..=0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let config = Config::new(
            "127.0.0.1:0".to_string(),
            "does/not/exist/model.onnx".to_string(),
            false,
        )
        .unwrap();

        match OnnxClassifier::new(&config) {
            Err(ClassifierError::ModelLoad(msg)) => assert!(msg.contains("not found")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("model should not load"),
        }
    }
}
