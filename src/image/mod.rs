pub mod loader;
pub mod postprocessing;
pub mod preprocessing;
pub mod transforms;

pub use loader::ImageLoader;
pub use postprocessing::ResultRanker;
pub use preprocessing::{ImagePreprocessor, InputTensor, INPUT_SIZE};
pub use transforms::ImageTransforms;
