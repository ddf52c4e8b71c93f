use crate::gesture::{CursorPosition, GestureEvent};
use crate::landmark::PinchGeometry;

// Markers to track how far a frame has made it through the pipeline
pub struct IngestedState;

pub struct MeasuredState {
    pub(super) geometry: PinchGeometry,
}

pub struct TrackedState {
    pub(super) geometry: PinchGeometry,
    pub(super) event: Option<GestureEvent>,
    pub(super) cursor: CursorPosition,
}

pub trait ProcessingState: 'static {
    fn state_name() -> &'static str;
}

impl ProcessingState for IngestedState {
    fn state_name() -> &'static str {
        "ingested"
    }
}

impl ProcessingState for MeasuredState {
    fn state_name() -> &'static str {
        "measured"
    }
}

impl ProcessingState for TrackedState {
    fn state_name() -> &'static str {
        "tracked"
    }
}
