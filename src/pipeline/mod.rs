//! Per-frame processing: landmarks in, gesture events and brightness changes out.

pub mod context;
pub mod orchestration;

pub use context::{FrameContext, FrameMetrics};
pub use orchestration::{FrameOutcome, PipelineStats, ProcessingPipeline, TrackedFrame};
