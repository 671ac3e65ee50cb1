pub mod classifier;
pub mod inference;
pub mod manager;

pub use classifier::OnnxClassifier;
pub use inference::{run_blocking, InferenceService};
pub use manager::{ModelManager, ModelStats};
