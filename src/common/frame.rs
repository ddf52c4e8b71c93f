use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::common::clock::Timestamp;
use crate::landmark::DetectorResult;

/// One unit of work for the pipeline: whatever the detector saw in a single
/// camera frame.
#[derive(Debug, Clone)]
pub struct Frame {
    frame_id: Uuid,
    captured_at: Timestamp,
    received_at: DateTime<Utc>,
    detection: DetectorResult,
}

impl Frame {
    pub fn new(captured_at: Timestamp, detection: DetectorResult) -> Self {
        Self {
            frame_id: Uuid::new_v4(),
            captured_at,
            received_at: Utc::now(),
            detection,
        }
    }

    pub fn frame_id(&self) -> Uuid {
        self.frame_id
    }

    pub fn captured_at(&self) -> Timestamp {
        self.captured_at
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn detection(&self) -> &DetectorResult {
        &self.detection
    }
}
