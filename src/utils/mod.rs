pub mod error;
pub mod memory;

pub use memory::{TensorTracker, TrackedTensor};
