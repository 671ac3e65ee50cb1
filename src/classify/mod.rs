pub mod session;
pub mod types;

pub use session::ClassificationSession;
pub use types::{
    ClassificationOutcome, ClassifyStage, ClassifyStatus, RankedResult, CLASS_COLORS, CLASS_NAMES,
};
