use std::sync::Arc;
use std::time::Instant;

use crate::common::Frame;
use crate::gesture::{CursorPosition, GestureEvent};
use crate::landmark::{LandmarkSnapshot, PinchGeometry};
use crate::pipeline::context::metrics::FrameMetrics;
use crate::pipeline::context::state::{IngestedState, MeasuredState, ProcessingState, TrackedState};

// FrameContext with compile-time state tracking: geometry only exists once
// measured, gesture output only once tracked.
pub struct FrameContext<S> {
    frame: Arc<Frame>,
    metrics: FrameMetrics,
    stage_start: Instant,
    state: S,
}

impl<S: ProcessingState> FrameContext<S> {
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }

    pub fn stage_name(&self) -> &'static str {
        S::state_name()
    }

    fn advance<T: ProcessingState>(mut self, state: T) -> FrameContext<T> {
        let now = Instant::now();
        self.metrics
            .record_stage(T::state_name(), now.duration_since(self.stage_start));
        FrameContext {
            frame: self.frame,
            metrics: self.metrics,
            stage_start: now,
            state,
        }
    }

    pub fn into_metrics(self) -> FrameMetrics {
        self.metrics
    }
}

impl FrameContext<IngestedState> {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame: Arc::new(frame),
            metrics: FrameMetrics::new(),
            stage_start: Instant::now(),
            state: IngestedState,
        }
    }

    pub fn snapshot(&self) -> Option<&LandmarkSnapshot> {
        self.frame.detection().snapshot()
    }

    pub fn into_measured(self, geometry: PinchGeometry) -> FrameContext<MeasuredState> {
        self.advance(MeasuredState { geometry })
    }
}

impl FrameContext<MeasuredState> {
    pub fn geometry(&self) -> &PinchGeometry {
        &self.state.geometry
    }

    pub fn into_tracked(
        self,
        event: Option<GestureEvent>,
        cursor: CursorPosition,
    ) -> FrameContext<TrackedState> {
        let geometry = self.state.geometry;
        self.advance(TrackedState {
            geometry,
            event,
            cursor,
        })
    }
}

impl FrameContext<TrackedState> {
    pub fn geometry(&self) -> &PinchGeometry {
        &self.state.geometry
    }

    pub fn event(&self) -> Option<GestureEvent> {
        self.state.event
    }

    pub fn cursor(&self) -> CursorPosition {
        self.state.cursor
    }
}
