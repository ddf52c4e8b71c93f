use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::common::Timestamp;

/// Pixel-space rectangle with exclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Region {
    pub fn contains(&self, (x, y): (i32, i32)) -> bool {
        x > self.left && x < self.right && y > self.top && y < self.bottom
    }

    /// True when no point can ever be inside.
    pub fn is_empty(&self) -> bool {
        i64::from(self.right) - i64::from(self.left) < 2
            || i64::from(self.bottom) - i64::from(self.top) < 2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PinchConfig {
    /// Thumb/index distance below which the fingers count as touching.
    pub engage_threshold_px: f64,
    /// Minimum engaged time for a release to be confirmed.
    pub min_hold: Duration,
    /// When set, the release midpoint must be inside this region.
    pub region: Option<Region>,
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            engage_threshold_px: 30.0,
            min_hold: Duration::from_secs(1),
            region: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchState {
    Released,
    Engaged { since: Timestamp },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Engaged { at: Timestamp },
    Released { held: Duration, confirmed: bool },
}

impl GestureEvent {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, GestureEvent::Released { confirmed: true, .. })
    }
}

/// Turns one thumb/index distance per frame into engage/release events.
///
/// Frames without a usable hand must not be fed at all: skipping a frame
/// leaves the state, including the hold start, untouched.
#[derive(Debug, Clone)]
pub struct PinchGestureTracker {
    config: PinchConfig,
    state: PinchState,
}

impl PinchGestureTracker {
    pub fn new(config: PinchConfig) -> Self {
        Self {
            config,
            state: PinchState::Released,
        }
    }

    pub fn config(&self) -> &PinchConfig {
        &self.config
    }

    pub fn state(&self) -> PinchState {
        self.state
    }

    pub fn is_engaged(&self) -> bool {
        matches!(self.state, PinchState::Engaged { .. })
    }

    pub fn engaged_since(&self) -> Option<Timestamp> {
        match self.state {
            PinchState::Engaged { since } => Some(since),
            PinchState::Released => None,
        }
    }

    pub fn update(
        &mut self,
        distance: f64,
        midpoint: (i32, i32),
        now: Timestamp,
    ) -> Option<GestureEvent> {
        let touching = distance < self.config.engage_threshold_px;
        match (self.state, touching) {
            (PinchState::Released, true) => {
                self.state = PinchState::Engaged { since: now };
                debug!("Pinch engaged at {} (distance {:.1}px)", now, distance);
                Some(GestureEvent::Engaged { at: now })
            }
            (PinchState::Engaged { since }, false) => {
                self.state = PinchState::Released;
                let held = now.saturating_duration_since(since);
                let in_region = self
                    .config
                    .region
                    .map_or(true, |region| region.contains(midpoint));
                let confirmed = held >= self.config.min_hold && in_region;
                if confirmed {
                    info!("Pinch confirmed after {:?} at {:?}", held, midpoint);
                } else {
                    debug!(
                        "Pinch released after {:?} at {:?} (in region: {})",
                        held, midpoint, in_region
                    );
                }
                Some(GestureEvent::Released { held, confirmed })
            }
            (PinchState::Engaged { .. }, true) | (PinchState::Released, false) => None,
        }
    }
}

impl Default for PinchGestureTracker {
    fn default() -> Self {
        Self::new(PinchConfig::default())
    }
}
