use crate::{
    common::Frame,
    config::Configuration,
    error::AppError,
    intake::FrameReader,
    pipeline::{PipelineStats, ProcessingPipeline},
};
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owns the reader and pipeline tasks and the frame channel between them.
///
/// Frames are handed over in arrival order through a bounded channel of
/// `frame_buffer_size` entries. When the buffer is full the reader waits,
/// so frames are never dropped.
pub struct Coordinator {
    reader_task: Option<JoinHandle<()>>,
    pipeline_task: Option<JoinHandle<PipelineStats>>,
    cancel_token: CancellationToken,
}

impl Coordinator {
    fn new(
        configuration: Configuration,
        reader: Box<dyn FrameReader>,
        pipeline: ProcessingPipeline,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let (frame_tx, frame_rx) = tokio::sync::mpsc::channel(configuration.frame_buffer_size);

        Self {
            reader_task: Some(Self::start_reader_task(reader, frame_tx, cancel_token.clone())),
            pipeline_task: Some(Self::start_pipeline_task(
                pipeline,
                frame_rx,
                cancel_token.clone(),
            )),
            cancel_token,
        }
    }

    fn start_reader_task(
        mut reader: Box<dyn FrameReader>,
        frame_tx: Sender<Frame>,
        cancel_token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("Reading frames from {}", reader.name());
            loop {
                let next = tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    next = reader.read() => next,
                };
                match next {
                    Ok(Some(frame)) => {
                        if frame_tx.send(frame).await.is_err() {
                            tracing::debug!("Pipeline gone, stopping {}", reader.name());
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::info!("Input from {} exhausted", reader.name());
                        break;
                    }
                    Err(e) if e.is_recoverable() => {
                        tracing::warn!("Dropping bad input from {}: {}", reader.name(), e);
                    }
                    Err(e) => {
                        tracing::error!("Reader {} failed: {}", reader.name(), e);
                        break;
                    }
                }
            }
        })
    }

    fn start_pipeline_task(
        mut pipeline: ProcessingPipeline,
        mut frame_rx: Receiver<Frame>,
        cancel_token: CancellationToken,
    ) -> JoinHandle<PipelineStats> {
        tokio::spawn(async move {
            loop {
                let frame = tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => break,
                    frame = frame_rx.recv() => frame,
                };
                let Some(frame) = frame else {
                    break;
                };
                pipeline.process(frame).await;
            }
            tracing::debug!("Pipeline stopped: {}", pipeline.stats());
            pipeline.into_stats()
        })
    }

    /// Token that stops both tasks when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Waits until the input is exhausted or the coordinator is stopped,
    /// then returns the pipeline's counters.
    pub async fn wait(mut self) -> Result<PipelineStats, AppError> {
        let pipeline_task = self
            .pipeline_task
            .take()
            .ok_or_else(|| AppError::Pipeline("Pipeline task already joined".to_string()))?;
        let stats = pipeline_task
            .await
            .map_err(|e| AppError::Pipeline(format!("Pipeline task failed: {}", e)))?;

        // The reader may still be blocked on input nobody will consume.
        self.cancel_token.cancel();
        if let Some(reader_task) = self.reader_task.take() {
            if let Err(e) = reader_task.await {
                tracing::warn!("Reader task failed: {}", e);
            }
        }
        Ok(stats)
    }

    pub fn stop(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    reader: Option<Box<dyn FrameReader>>,
    pipeline: Option<ProcessingPipeline>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            reader: None,
            pipeline: None,
        }
    }

    // Adjusts the frame buffer size, this will override the configuration.
    pub fn frame_buffer_size(mut self, frame_buffer_size: usize) -> Self {
        self.configuration.frame_buffer_size = frame_buffer_size;
        self
    }

    pub fn reader(mut self, reader: Box<dyn FrameReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn pipeline(mut self, pipeline: ProcessingPipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Spawns the tasks. Must be called from within a Tokio runtime.
    pub fn build(self) -> Result<Coordinator, AppError> {
        let reader = self
            .reader
            .ok_or(AppError::Pipeline("Frame reader not set".to_string()))?;
        let pipeline = self
            .pipeline
            .ok_or(AppError::Pipeline("Pipeline not set".to_string()))?;
        if self.configuration.frame_buffer_size == 0 {
            return Err(AppError::Pipeline(
                "Frame buffer size must be greater than 0".to_string(),
            ));
        }
        Ok(Coordinator::new(self.configuration, reader, pipeline))
    }
}
