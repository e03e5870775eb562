pub mod detection;
pub mod models;

pub use detection::FingerCountPipeline;
pub use models::{FingerCount, FrameResult};
