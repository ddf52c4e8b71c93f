pub mod brightness;
pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod gesture;
pub mod intake;
pub mod landmark;
pub mod pipeline;

pub use error::{AppError, BrightnessError, ConfigError, GeometryError, SnapshotError, SourceError};

pub use config::Configuration;
pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use gesture::{GestureEvent, PinchConfig, PinchGestureTracker};
pub use pipeline::{FrameOutcome, PipelineStats, ProcessingPipeline};
