pub mod clock;
pub mod frame;

pub use clock::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use frame::Frame;
