use chrono::Utc;
use tower::{Service, ServiceExt};
use tracing::{debug, info, trace, warn};

use crate::brightness::{BrightnessCommand, BrightnessDispatcher};
use crate::common::Frame;
use crate::error::GeometryError;
use crate::gesture::{CursorMapper, CursorPosition, GestureEvent, PinchConfig, PinchGestureTracker};
use crate::landmark::{DebugSnapshotWriter, PinchGeometry};
use crate::pipeline::context::FrameContext;
use crate::pipeline::orchestration::stats::PipelineStats;

/// What the pipeline made of one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// The detector saw no hand. The tracker was left alone.
    NoDetection,
    /// A hand was seen but the thumb or index tip was missing.
    Skipped(GeometryError),
    Tracked(TrackedFrame),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedFrame {
    pub geometry: PinchGeometry,
    pub event: Option<GestureEvent>,
    pub cursor: CursorPosition,
    /// New brightness level if a confirmed pinch toggled it on this frame.
    pub brightness: Option<u8>,
}

/// Single-consumer processing of detector frames: geometry, gesture
/// tracking, cursor mapping and brightness dispatch, in frame order.
pub struct ProcessingPipeline {
    tracker: PinchGestureTracker,
    cursor: CursorMapper,
    debug_writer: Option<DebugSnapshotWriter>,
    dispatcher: Option<BrightnessDispatcher>,
    stats: PipelineStats,
}

impl ProcessingPipeline {
    pub fn builder() -> ProcessingPipelineBuilder {
        ProcessingPipelineBuilder::default()
    }

    pub fn tracker(&self) -> &PinchGestureTracker {
        &self.tracker
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn into_stats(self) -> PipelineStats {
        self.stats
    }

    pub async fn process(&mut self, frame: Frame) -> FrameOutcome {
        self.stats.frames += 1;
        let context = FrameContext::new(frame);
        let frame_id = context.frame().frame_id();

        let Some(snapshot) = context.snapshot() else {
            trace!("Frame {}: no hand", frame_id);
            self.stats.no_detection += 1;
            return FrameOutcome::NoDetection;
        };

        if let Some(writer) = &self.debug_writer {
            if let Err(e) = writer.write(snapshot).await {
                warn!("Failed to write debug snapshot {:?}: {}", writer.path(), e);
                self.stats.debug_write_failures += 1;
            }
        }

        let geometry = match PinchGeometry::derive(snapshot) {
            Ok(geometry) => geometry,
            Err(e) => {
                warn!("Skipping frame {}: {}", frame_id, e);
                self.stats.skipped += 1;
                return FrameOutcome::Skipped(e);
            }
        };
        let context = context.into_measured(geometry);

        let event = self.tracker.update(
            geometry.distance,
            geometry.midpoint,
            context.frame().captured_at(),
        );
        let cursor = self.cursor.map(geometry.center, self.tracker.is_engaged());
        let context = context.into_tracked(event, cursor);

        let brightness = match event {
            Some(GestureEvent::Engaged { .. }) => {
                self.stats.engaged += 1;
                None
            }
            Some(GestureEvent::Released { confirmed, .. }) => {
                self.stats.released += 1;
                if confirmed {
                    self.stats.confirmed += 1;
                    self.dispatch(BrightnessCommand::Toggle).await
                } else {
                    None
                }
            }
            None => None,
        };

        let queued = Utc::now() - context.frame().received_at();
        debug!(
            "Frame {} at {}: distance {:.1}px cursor {}%,{}% (queued {}ms, {})",
            frame_id,
            context.frame().captured_at(),
            geometry.distance,
            cursor.x_percent,
            cursor.y_percent,
            queued.num_milliseconds(),
            context.metrics()
        );

        FrameOutcome::Tracked(TrackedFrame {
            geometry,
            event,
            cursor,
            brightness,
        })
    }

    async fn dispatch(&mut self, command: BrightnessCommand) -> Option<u8> {
        let Some(dispatcher) = self.dispatcher.as_mut() else {
            info!("Pinch confirmed, no brightness control configured");
            return None;
        };

        let result = match dispatcher.ready().await {
            Ok(service) => service.call(command).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(level) => {
                info!("Brightness set to {}%", level);
                self.stats.brightness_changes += 1;
                Some(level)
            }
            Err(e) if e.is::<tower::timeout::error::Elapsed>() => {
                warn!("Brightness change {:?} timed out", command);
                self.stats.brightness_failures += 1;
                None
            }
            Err(e) => {
                warn!("Brightness change {:?} failed: {}", command, e);
                self.stats.brightness_failures += 1;
                None
            }
        }
    }
}

#[derive(Default)]
pub struct ProcessingPipelineBuilder {
    pinch: PinchConfig,
    cursor: CursorMapper,
    debug_writer: Option<DebugSnapshotWriter>,
    dispatcher: Option<BrightnessDispatcher>,
}

impl ProcessingPipelineBuilder {
    pub fn pinch_config(mut self, pinch: PinchConfig) -> Self {
        self.pinch = pinch;
        self
    }

    pub fn cursor_mapper(mut self, cursor: CursorMapper) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn debug_writer(mut self, writer: DebugSnapshotWriter) -> Self {
        self.debug_writer = Some(writer);
        self
    }

    pub fn dispatcher(mut self, dispatcher: BrightnessDispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn build(self) -> ProcessingPipeline {
        ProcessingPipeline {
            tracker: PinchGestureTracker::new(self.pinch),
            cursor: self.cursor,
            debug_writer: self.debug_writer,
            dispatcher: self.dispatcher,
            stats: PipelineStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brightness::{BrightnessControl, BrightnessService, MemoryBrightness};
    use crate::common::Timestamp;
    use crate::error::BrightnessError;
    use crate::landmark::{DetectorResult, Finger, LandmarkSnapshot};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use uuid::Uuid;

    fn hand(millis: u64, gap: i32) -> Frame {
        let snapshot = LandmarkSnapshot::from_points([
            (Finger::Thumb, (300, 200)),
            (Finger::Index, (300 + gap, 200)),
        ]);
        Frame::new(
            Timestamp::from_millis(millis),
            DetectorResult::from_snapshot(snapshot),
        )
    }

    fn no_hand(millis: u64) -> Frame {
        Frame::new(Timestamp::from_millis(millis), DetectorResult::NoHand)
    }

    fn thumb_only(millis: u64) -> Frame {
        let snapshot = LandmarkSnapshot::from_points([(Finger::Thumb, (300, 200))]);
        Frame::new(
            Timestamp::from_millis(millis),
            DetectorResult::from_snapshot(snapshot),
        )
    }

    fn pipeline_with(control: Arc<Mutex<MemoryBrightness>>) -> ProcessingPipeline {
        ProcessingPipeline::builder()
            .dispatcher(BrightnessService::from_shared(control).into_dispatcher(None))
            .build()
    }

    #[tokio::test]
    async fn confirmed_pinch_toggles_brightness() {
        let control = Arc::new(Mutex::new(MemoryBrightness::new(100)));
        let mut pipeline = pipeline_with(control.clone());

        assert!(matches!(
            pipeline.process(hand(0, 50)).await,
            FrameOutcome::Tracked(TrackedFrame { event: None, .. })
        ));
        let FrameOutcome::Tracked(engaged) = pipeline.process(hand(100, 10)).await else {
            panic!("expected a tracked frame");
        };
        assert_eq!(
            engaged.event,
            Some(GestureEvent::Engaged {
                at: Timestamp::from_millis(100)
            })
        );
        assert!(engaged.cursor.pinched);

        // Gaps neither release nor restart the hold.
        assert_eq!(pipeline.process(no_hand(500)).await, FrameOutcome::NoDetection);
        assert_eq!(
            pipeline.process(thumb_only(700)).await,
            FrameOutcome::Skipped(GeometryError::MissingLandmark(Finger::Index))
        );
        assert!(pipeline.tracker().is_engaged());

        let FrameOutcome::Tracked(released) = pipeline.process(hand(1200, 50)).await else {
            panic!("expected a tracked frame");
        };
        assert_eq!(
            released.event,
            Some(GestureEvent::Released {
                held: Duration::from_millis(1100),
                confirmed: true,
            })
        );
        assert_eq!(released.brightness, Some(0));
        assert!(!released.cursor.pinched);
        assert_eq!(control.lock().unwrap().level(), 0);

        assert_eq!(
            pipeline.stats(),
            &PipelineStats {
                frames: 5,
                no_detection: 1,
                skipped: 1,
                engaged: 1,
                released: 1,
                confirmed: 1,
                brightness_changes: 1,
                brightness_failures: 0,
                debug_write_failures: 0,
            }
        );
    }

    #[tokio::test]
    async fn short_pinch_leaves_brightness_alone() {
        let control = Arc::new(Mutex::new(MemoryBrightness::new(0)));
        let mut pipeline = pipeline_with(control.clone());

        pipeline.process(hand(0, 5)).await;
        let FrameOutcome::Tracked(released) = pipeline.process(hand(999, 40)).await else {
            panic!("expected a tracked frame");
        };
        assert!(!released.event.unwrap().is_confirmed());
        assert_eq!(released.brightness, None);
        assert_eq!(control.lock().unwrap().writes(), 0);
    }

    #[tokio::test]
    async fn works_without_a_dispatcher() {
        let mut pipeline = ProcessingPipeline::builder().build();
        pipeline.process(hand(0, 5)).await;
        let FrameOutcome::Tracked(released) = pipeline.process(hand(2000, 40)).await else {
            panic!("expected a tracked frame");
        };
        assert!(released.event.unwrap().is_confirmed());
        assert_eq!(released.brightness, None);
        assert_eq!(pipeline.stats().confirmed, 1);
    }

    struct BrokenDisplay;

    impl BrightnessControl for BrokenDisplay {
        fn name(&self) -> &str {
            "broken"
        }

        fn brightness(&mut self) -> Result<u8, BrightnessError> {
            Err(BrightnessError::InvalidValue("garbage".to_string()))
        }

        fn set_brightness(&mut self, _percent: u8) -> Result<(), BrightnessError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn dispatch_failures_are_counted_not_fatal() {
        let mut pipeline = ProcessingPipeline::builder()
            .dispatcher(BrightnessService::new(BrokenDisplay).into_dispatcher(None))
            .build();

        pipeline.process(hand(0, 5)).await;
        let FrameOutcome::Tracked(released) = pipeline.process(hand(1500, 40)).await else {
            panic!("expected a tracked frame");
        };
        assert_eq!(released.brightness, None);
        assert_eq!(pipeline.stats().brightness_failures, 1);

        // Keeps tracking afterwards.
        assert!(matches!(
            pipeline.process(hand(1600, 5)).await,
            FrameOutcome::Tracked(TrackedFrame {
                event: Some(GestureEvent::Engaged { .. }),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn writes_debug_snapshot_for_hand_frames() {
        let path = std::env::temp_dir().join(format!("SharedMem-{}.txt", Uuid::new_v4()));
        let writer = DebugSnapshotWriter::create(&path).await.unwrap();
        let mut pipeline = ProcessingPipeline::builder().debug_writer(writer).build();

        pipeline.process(hand(0, 7)).await;
        assert_eq!(
            tokio::fs::read_to_string(&path).await.unwrap(),
            "{\n\tTHUMB:\tX:300 Y:200\n\tINDEX:\tX:307 Y:200\n}\n"
        );

        // A no-hand frame keeps the last snapshot on disk.
        pipeline.process(no_hand(10)).await;
        assert!(tokio::fs::read_to_string(&path)
            .await
            .unwrap()
            .contains("INDEX"));

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
