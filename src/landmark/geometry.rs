use crate::error::GeometryError;
use crate::landmark::{Finger, LandmarkSnapshot};

fn lookup(snapshot: &LandmarkSnapshot, finger: Finger) -> Result<(i32, i32), GeometryError> {
    snapshot
        .get(finger)
        .ok_or(GeometryError::MissingLandmark(finger))
}

/// Euclidean pixel distance between two landmarks.
pub fn distance(snapshot: &LandmarkSnapshot, a: Finger, b: Finger) -> Result<f64, GeometryError> {
    let (x1, y1) = lookup(snapshot, a)?;
    let (x2, y2) = lookup(snapshot, b)?;
    let dx = f64::from(x2) - f64::from(x1);
    let dy = f64::from(y2) - f64::from(y1);
    Ok(dx.hypot(dy))
}

/// Midpoint of two landmarks, rounded down to whole pixels.
pub fn midpoint(
    snapshot: &LandmarkSnapshot,
    a: Finger,
    b: Finger,
) -> Result<(i32, i32), GeometryError> {
    let (x1, y1) = lookup(snapshot, a)?;
    let (x2, y2) = lookup(snapshot, b)?;
    Ok((floor_half(x1, x2), floor_half(y1, y2)))
}

fn floor_half(a: i32, b: i32) -> i32 {
    // i64 so that the sum cannot overflow; the half always fits back in i32.
    ((i64::from(a) + i64::from(b)).div_euclid(2)) as i32
}

/// Thumb/index geometry for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchGeometry {
    pub thumb: (i32, i32),
    pub index: (i32, i32),
    pub distance: f64,
    pub midpoint: (i32, i32),
    /// Unrounded midpoint, for cursor mapping.
    pub center: (f64, f64),
}

impl PinchGeometry {
    pub fn derive(snapshot: &LandmarkSnapshot) -> Result<Self, GeometryError> {
        let thumb = lookup(snapshot, Finger::Thumb)?;
        let index = lookup(snapshot, Finger::Index)?;
        Ok(Self {
            thumb,
            index,
            distance: distance(snapshot, Finger::Thumb, Finger::Index)?,
            midpoint: midpoint(snapshot, Finger::Thumb, Finger::Index)?,
            center: (
                (f64::from(thumb.0) + f64::from(index.0)) / 2.0,
                (f64::from(thumb.1) + f64::from(index.1)) / 2.0,
            ),
        })
    }
}
