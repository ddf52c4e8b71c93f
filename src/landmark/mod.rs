//! Per-frame hand landmark data as delivered by the external detector.
//!
//! Only the five fingertips are tracked. A [`LandmarkSnapshot`] is built
//! fresh for every frame and never mutated afterwards.

pub mod debug_snapshot;
pub mod geometry;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use debug_snapshot::{format_snapshot, parse_snapshot, DebugSnapshotWriter};
pub use geometry::{distance, midpoint, PinchGeometry};

/// Fingertip landmarks, in the order they appear in debug output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Position of this fingertip in the detector's 21-point hand landmark list.
    pub fn detector_index(&self) -> usize {
        match self {
            Finger::Thumb => 4,
            Finger::Index => 8,
            Finger::Middle => 12,
            Finger::Ring => 16,
            Finger::Pinky => 20,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Finger::Thumb => "THUMB",
            Finger::Index => "INDEX",
            Finger::Middle => "MIDDLE",
            Finger::Ring => "RING",
            Finger::Pinky => "PINKY",
        }
    }

    pub fn from_label(label: &str) -> Option<Finger> {
        Finger::ALL
            .into_iter()
            .find(|finger| finger.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Finger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LandmarkPoint {
    pub finger: Finger,
    pub x: i32,
    pub y: i32,
}

/// Fingertip pixel coordinates for a single tracked hand in one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LandmarkSnapshot {
    points: BTreeMap<Finger, (i32, i32)>,
}

impl LandmarkSnapshot {
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (Finger, (i32, i32))>,
    {
        Self {
            points: points.into_iter().collect(),
        }
    }

    /// Picks the fingertips out of a full detector landmark list. Fingertips
    /// beyond the end of a short list are left out of the snapshot.
    pub fn from_detector_list(landmarks: &[(i32, i32)]) -> Self {
        Self::from_points(Finger::ALL.into_iter().filter_map(|finger| {
            landmarks
                .get(finger.detector_index())
                .map(|position| (finger, *position))
        }))
    }

    pub fn get(&self, finger: Finger) -> Option<(i32, i32)> {
        self.points.get(&finger).copied()
    }

    pub fn point(&self, finger: Finger) -> Option<LandmarkPoint> {
        self.get(finger).map(|(x, y)| LandmarkPoint { finger, x, y })
    }

    pub fn contains(&self, finger: Finger) -> bool {
        self.points.contains_key(&finger)
    }

    /// Points in thumb-to-pinky order.
    pub fn points(&self) -> impl Iterator<Item = LandmarkPoint> + '_ {
        self.points
            .iter()
            .map(|(finger, (x, y))| LandmarkPoint {
                finger: *finger,
                x: *x,
                y: *y,
            })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<LandmarkPoint> for LandmarkSnapshot {
    fn from_iter<T: IntoIterator<Item = LandmarkPoint>>(iter: T) -> Self {
        Self::from_points(iter.into_iter().map(|p| (p.finger, (p.x, p.y))))
    }
}

/// What the detector reported for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorResult {
    NoHand,
    Hand(LandmarkSnapshot),
}

impl DetectorResult {
    /// An empty snapshot carries no hand, so it is folded into `NoHand`.
    pub fn from_snapshot(snapshot: LandmarkSnapshot) -> Self {
        if snapshot.is_empty() {
            DetectorResult::NoHand
        } else {
            DetectorResult::Hand(snapshot)
        }
    }

    pub fn snapshot(&self) -> Option<&LandmarkSnapshot> {
        match self {
            DetectorResult::NoHand => None,
            DetectorResult::Hand(snapshot) => Some(snapshot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_hand() -> Vec<(i32, i32)> {
        (0..21).map(|i| (i * 10, i * 10 + 1)).collect()
    }

    #[test]
    fn detector_list_picks_fingertips() {
        let snapshot = LandmarkSnapshot::from_detector_list(&full_hand());
        assert_eq!(snapshot.len(), 5);
        assert_eq!(snapshot.get(Finger::Thumb), Some((40, 41)));
        assert_eq!(snapshot.get(Finger::Index), Some((80, 81)));
        assert_eq!(snapshot.get(Finger::Pinky), Some((200, 201)));
    }

    #[test]
    fn short_detector_list_drops_unreached_fingertips() {
        let landmarks = &full_hand()[..9];
        let snapshot = LandmarkSnapshot::from_detector_list(landmarks);
        assert!(snapshot.contains(Finger::Thumb));
        assert!(snapshot.contains(Finger::Index));
        assert!(!snapshot.contains(Finger::Middle));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn points_iterate_in_finger_order() {
        let snapshot = LandmarkSnapshot::from_points([
            (Finger::Pinky, (5, 5)),
            (Finger::Thumb, (1, 1)),
            (Finger::Ring, (4, 4)),
        ]);
        let order: Vec<Finger> = snapshot.points().map(|p| p.finger).collect();
        assert_eq!(order, vec![Finger::Thumb, Finger::Ring, Finger::Pinky]);
    }

    #[test]
    fn labels_round_trip_case_insensitively() {
        for finger in Finger::ALL {
            assert_eq!(Finger::from_label(finger.label()), Some(finger));
        }
        assert_eq!(Finger::from_label("index"), Some(Finger::Index));
        assert_eq!(Finger::from_label("WRIST"), None);
    }

    #[test]
    fn empty_snapshot_means_no_hand() {
        let result = DetectorResult::from_snapshot(LandmarkSnapshot::default());
        assert_eq!(result, DetectorResult::NoHand);
        assert!(result.snapshot().is_none());
    }
}
