//! Pinch gesture recognition over thumb/index geometry.

pub mod cursor;
pub mod tracker;

pub use cursor::{CursorMapper, CursorPosition};
pub use tracker::{GestureEvent, PinchConfig, PinchGestureTracker, PinchState, Region};
