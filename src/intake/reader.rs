use async_trait::async_trait;

use crate::common::Frame;
use crate::error::SourceError;

/// Source of detector output, one frame per call.
#[async_trait]
pub trait FrameReader: Send {
    /// Next frame, or `None` once the input is exhausted.
    async fn read(&mut self) -> Result<Option<Frame>, SourceError>;

    fn name(&self) -> &'static str;
}
