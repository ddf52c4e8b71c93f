use serde::Deserialize;

/// Screen-relative cursor derived from the pinch midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    pub x_percent: u8,
    pub y_percent: u8,
    pub pinched: bool,
}

/// Maps camera-space pixels to a 0..=100 percentage of the screen.
///
/// Positions away from the centre band are pushed further out so that the
/// screen edges can be reached without moving the hand out of the camera's
/// view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CursorMapper {
    pub frame_width: u32,
    pub frame_height: u32,
}

impl CursorMapper {
    const CENTER_LOW: i64 = 45;
    const CENTER_HIGH: i64 = 55;
    const EDGE_PUSH: i64 = 10;

    pub fn new(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width,
            frame_height,
        }
    }

    /// `center` is the unrounded thumb/index midpoint in camera pixels.
    pub fn map(&self, center: (f64, f64), pinched: bool) -> CursorPosition {
        CursorPosition {
            x_percent: Self::axis(center.0, self.frame_width),
            y_percent: Self::axis(center.1, self.frame_height),
            pinched,
        }
    }

    fn axis(value: f64, extent: u32) -> u8 {
        let percent = (value * 100.0 / f64::from(extent.max(1))).round() as i64;
        let pushed = if percent < Self::CENTER_LOW {
            percent - Self::EDGE_PUSH
        } else if percent > Self::CENTER_HIGH {
            percent + Self::EDGE_PUSH
        } else {
            percent
        };
        pushed.clamp(0, 100) as u8
    }
}

impl Default for CursorMapper {
    fn default() -> Self {
        Self::new(690, 350)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Finger, LandmarkSnapshot, PinchGeometry};

    #[test]
    fn centre_band_is_left_alone() {
        let mapper = CursorMapper::new(100, 100);
        let cursor = mapper.map((50.0, 45.0), false);
        assert_eq!((cursor.x_percent, cursor.y_percent), (50, 45));
        assert!(!cursor.pinched);
    }

    #[test]
    fn off_centre_positions_are_pushed_outwards() {
        let mapper = CursorMapper::new(100, 100);
        let cursor = mapper.map((30.0, 70.0), true);
        assert_eq!((cursor.x_percent, cursor.y_percent), (20, 80));
        assert!(cursor.pinched);
    }

    #[test]
    fn results_are_clamped() {
        let mapper = CursorMapper::new(100, 100);
        let cursor = mapper.map((5.0, 95.0), false);
        assert_eq!((cursor.x_percent, cursor.y_percent), (0, 100));

        let outside = mapper.map((-40.0, 400.0), false);
        assert_eq!((outside.x_percent, outside.y_percent), (0, 100));
    }

    #[test]
    fn default_frame_matches_camera_preview() {
        let mapper = CursorMapper::default();
        // 345 / 690 = 50%, 175 / 350 = 50%
        let cursor = mapper.map((345.0, 175.0), false);
        assert_eq!((cursor.x_percent, cursor.y_percent), (50, 50));
    }

    #[test]
    fn half_pixel_midpoint_rounds_up() {
        let mapper = CursorMapper::new(100, 100);
        let geometry = PinchGeometry::derive(&LandmarkSnapshot::from_points([
            (Finger::Thumb, (50, 40)),
            (Finger::Index, (51, 41)),
        ]))
        .unwrap();
        // 50.5% rounds to 51 and stays in the centre band. 40.5% rounds to 41, then gets pushed to 31.
        let cursor = mapper.map(geometry.center, false);
        assert_eq!((cursor.x_percent, cursor.y_percent), (51, 31));
    }

    #[test]
    fn zero_sized_frame_does_not_divide_by_zero() {
        let mapper = CursorMapper::new(0, 0);
        let cursor = mapper.map((0.0, 0.0), false);
        assert_eq!((cursor.x_percent, cursor.y_percent), (0, 0));
    }
}
