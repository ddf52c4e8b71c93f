pub mod processing_pipeline;
pub mod stats;

pub use processing_pipeline::{
    FrameOutcome, ProcessingPipeline, ProcessingPipelineBuilder, TrackedFrame,
};
pub use stats::PipelineStats;
