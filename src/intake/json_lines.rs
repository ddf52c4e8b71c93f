use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, trace, warn};

use crate::common::{Clock, Frame, Timestamp};
use crate::error::SourceError;
use crate::intake::FrameReader;
use crate::landmark::{DetectorResult, Finger, LandmarkSnapshot};

/// One line of detector output.
#[derive(Debug, Deserialize)]
struct DetectionRecord {
    #[serde(default)]
    timestamp_ms: Option<u64>,
    #[serde(default)]
    hands: Vec<HandRecord>,
}

#[derive(Debug, Deserialize)]
struct HandRecord {
    #[serde(default)]
    handedness: Option<String>,
    #[serde(default = "HandRecord::full_score")]
    score: f32,
    /// Full 21-point landmark list in pixel coordinates.
    #[serde(default)]
    landmarks: Vec<(i32, i32)>,
    /// Fingertips by name, used instead of `landmarks` when present.
    #[serde(default)]
    fingers: BTreeMap<Finger, (i32, i32)>,
}

impl HandRecord {
    fn full_score() -> f32 {
        1.0
    }

    fn into_snapshot(self) -> LandmarkSnapshot {
        if self.fingers.is_empty() {
            LandmarkSnapshot::from_detector_list(&self.landmarks)
        } else {
            LandmarkSnapshot::from_points(self.fingers)
        }
    }
}

/// Reads newline-delimited JSON detections, e.g. from a detector process
/// piped into stdin.
///
/// ```text
/// {"timestamp_ms": 1200, "hands": [{"handedness": "Right", "score": 0.93, "landmarks": [[312, 240], ...]}]}
/// ```
///
/// The first record decides the timeline. If it carries `timestamp_ms`, the
/// detector's timestamps are used throughout and a record without one reuses
/// the previous timestamp. Otherwise every frame is stamped with the reader's
/// clock and later `timestamp_ms` values are ignored.
pub struct JsonLinesReader<R> {
    lines: Lines<R>,
    line_number: usize,
    clock: Arc<dyn Clock>,
    min_confidence: f32,
    timeline: Timeline,
    warned_mixed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timeline {
    Unknown,
    Detector { last: Timestamp },
    Clock,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesReader<R> {
    pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.7;

    pub fn new(reader: R, clock: Arc<dyn Clock>) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            clock,
            min_confidence: Self::DEFAULT_MIN_CONFIDENCE,
            timeline: Timeline::Unknown,
            warned_mixed: false,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    fn stamp(&mut self, timestamp_ms: Option<u64>) -> Timestamp {
        match (self.timeline, timestamp_ms) {
            (Timeline::Unknown | Timeline::Detector { .. }, Some(millis)) => {
                let stamp = Timestamp::from_millis(millis);
                self.timeline = Timeline::Detector { last: stamp };
                stamp
            }
            (Timeline::Unknown, None) => {
                self.timeline = Timeline::Clock;
                self.clock.now()
            }
            (Timeline::Clock, None) => self.clock.now(),
            (Timeline::Detector { last }, None) => {
                self.warn_mixed("missing timestamp_ms, reusing the previous one");
                last
            }
            (Timeline::Clock, Some(_)) => {
                self.warn_mixed("ignoring timestamp_ms on a clock-stamped stream");
                self.clock.now()
            }
        }
    }

    fn warn_mixed(&mut self, action: &str) {
        if !self.warned_mixed {
            warn!("Line {}: {}", self.line_number, action);
            self.warned_mixed = true;
        }
    }

    fn select_hand(&self, hands: Vec<HandRecord>) -> DetectorResult {
        let candidates = hands.len();
        match hands.into_iter().find(|hand| hand.score >= self.min_confidence) {
            Some(hand) => {
                trace!(
                    "Tracking {} hand (score {:.2}) out of {} candidates",
                    hand.handedness.as_deref().unwrap_or("unknown"),
                    hand.score,
                    candidates
                );
                DetectorResult::from_snapshot(hand.into_snapshot())
            }
            None => {
                if candidates > 0 {
                    debug!(
                        "Ignoring {} hands below confidence {:.2}",
                        candidates, self.min_confidence
                    );
                }
                DetectorResult::NoHand
            }
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> FrameReader for JsonLinesReader<R> {
    async fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(None),
                // Not UTF-8. The bytes up to the newline are already consumed.
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    self.line_number += 1;
                    return Err(SourceError::Parse {
                        line: self.line_number,
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(SourceError::Read(e)),
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }

            let record: DetectionRecord =
                serde_json::from_str(&line).map_err(|e| SourceError::Parse {
                    line: self.line_number,
                    message: e.to_string(),
                })?;
            let captured_at = self.stamp(record.timestamp_ms);
            let detection = self.select_hand(record.hands);
            return Ok(Some(Frame::new(captured_at, detection)));
        }
    }

    fn name(&self) -> &'static str {
        "json-lines"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ManualClock;
    use std::io::Cursor;

    fn reader(input: &str) -> JsonLinesReader<Cursor<Vec<u8>>> {
        JsonLinesReader::new(
            Cursor::new(input.as_bytes().to_vec()),
            Arc::new(ManualClock::new(Timestamp::from_millis(7))),
        )
    }

    fn landmark_list(thumb: (i32, i32), index: (i32, i32)) -> String {
        let mut points = vec![(0, 0); 21];
        points[4] = thumb;
        points[8] = index;
        serde_json::to_string(&points).unwrap()
    }

    #[tokio::test]
    async fn reads_full_landmark_lists() {
        let input = format!(
            "{{\"timestamp_ms\": 1200, \"hands\": [{{\"handedness\": \"Right\", \"score\": 0.9, \"landmarks\": {}}}]}}\n",
            landmark_list((10, 20), (13, 24))
        );
        let mut reader = reader(&input);

        let frame = reader.read().await.unwrap().unwrap();
        assert_eq!(frame.captured_at(), Timestamp::from_millis(1200));
        let snapshot = frame.detection().snapshot().unwrap();
        assert_eq!(snapshot.get(Finger::Thumb), Some((10, 20)));
        assert_eq!(snapshot.get(Finger::Index), Some((13, 24)));
        assert_eq!(snapshot.len(), 5);

        assert!(reader.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reads_named_fingertips_and_stamps_with_clock() {
        let mut reader = reader("{\"hands\": [{\"fingers\": {\"THUMB\": [1, 2], \"INDEX\": [3, 4]}}]}\n");
        let frame = reader.read().await.unwrap().unwrap();
        assert_eq!(frame.captured_at(), Timestamp::from_millis(7));
        let snapshot = frame.detection().snapshot().unwrap();
        assert_eq!(snapshot.get(Finger::Index), Some((3, 4)));
        assert!(!snapshot.contains(Finger::Pinky));
    }

    #[tokio::test]
    async fn empty_hands_and_low_confidence_mean_no_hand() {
        let mut reader = reader(
            "{\"timestamp_ms\": 1, \"hands\": []}\n\n{\"timestamp_ms\": 2, \"hands\": [{\"score\": 0.4, \"fingers\": {\"THUMB\": [1, 2]}}]}\n",
        );
        let first = reader.read().await.unwrap().unwrap();
        assert_eq!(first.detection(), &DetectorResult::NoHand);
        let second = reader.read().await.unwrap().unwrap();
        assert_eq!(second.detection(), &DetectorResult::NoHand);
    }

    #[tokio::test]
    async fn picks_first_confident_hand() {
        let mut reader = reader(
            "{\"hands\": [{\"score\": 0.2, \"fingers\": {\"THUMB\": [1, 1]}}, {\"score\": 0.8, \"fingers\": {\"THUMB\": [9, 9]}}]}\n",
        )
        .with_min_confidence(0.5);
        let frame = reader.read().await.unwrap().unwrap();
        assert_eq!(
            frame.detection().snapshot().unwrap().get(Finger::Thumb),
            Some((9, 9))
        );
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_skipped() {
        let mut input = b"{\"timestamp_ms\": 1}\n".to_vec();
        input.extend_from_slice(b"{\"hands\": \xff}\n");
        input.extend_from_slice(b"{\"timestamp_ms\": 3}\n");
        let mut reader = JsonLinesReader::new(
            Cursor::new(input),
            Arc::new(ManualClock::default()),
        );

        let first = reader.read().await.unwrap().unwrap();
        assert_eq!(first.captured_at(), Timestamp::from_millis(1));

        let err = reader.read().await.unwrap_err();
        assert!(matches!(err, SourceError::Parse { line: 2, .. }));
        assert!(err.is_recoverable());

        let third = reader.read().await.unwrap().unwrap();
        assert_eq!(third.captured_at(), Timestamp::from_millis(3));
        assert!(reader.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn detector_timeline_sticks_once_chosen() {
        let mut reader = reader("{\"timestamp_ms\": 5000}\n{\"hands\": []}\n{\"timestamp_ms\": 5100}\n");
        assert_eq!(
            reader.read().await.unwrap().unwrap().captured_at(),
            Timestamp::from_millis(5000)
        );
        // No clock time (7ms) leaks into a detector-stamped stream.
        assert_eq!(
            reader.read().await.unwrap().unwrap().captured_at(),
            Timestamp::from_millis(5000)
        );
        assert_eq!(
            reader.read().await.unwrap().unwrap().captured_at(),
            Timestamp::from_millis(5100)
        );
    }

    #[tokio::test]
    async fn clock_timeline_ignores_later_timestamps() {
        let mut reader = reader("{\"hands\": []}\n{\"timestamp_ms\": 90000}\n");
        assert_eq!(
            reader.read().await.unwrap().unwrap().captured_at(),
            Timestamp::from_millis(7)
        );
        assert_eq!(
            reader.read().await.unwrap().unwrap().captured_at(),
            Timestamp::from_millis(7)
        );
    }

    #[tokio::test]
    async fn malformed_lines_are_recoverable() {
        let mut reader = reader("not json\n{\"timestamp_ms\": 5}\n");
        let err = reader.read().await.unwrap_err();
        assert!(matches!(err, SourceError::Parse { line: 1, .. }));
        assert!(err.is_recoverable());

        let frame = reader.read().await.unwrap().unwrap();
        assert_eq!(frame.captured_at(), Timestamp::from_millis(5));
    }
}
