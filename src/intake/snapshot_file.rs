use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};

use crate::common::{Clock, Frame};
use crate::error::SourceError;
use crate::intake::FrameReader;
use crate::landmark::{parse_snapshot, DetectorResult};

/// Polls a debug snapshot file written by another process and yields its
/// current contents once per tick. The file never "ends", so `read` only
/// returns `None` if the reader is dropped.
pub struct SnapshotFileReader {
    path: PathBuf,
    period: Duration,
    interval: Option<Interval>,
    clock: Arc<dyn Clock>,
}

impl SnapshotFileReader {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            period: Self::DEFAULT_POLL_INTERVAL,
            interval: None,
            clock,
        }
    }

    pub fn with_poll_interval(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn tick(&mut self) {
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });
        interval.tick().await;
    }
}

#[async_trait]
impl FrameReader for SnapshotFileReader {
    async fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        self.tick().await;
        let captured_at = self.clock.now();
        let detection = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => parse_snapshot(&text)?,
            // Nobody has written a hand yet.
            Err(e) if e.kind() == ErrorKind::NotFound => DetectorResult::NoHand,
            Err(e) => return Err(SourceError::Read(e)),
        };
        Ok(Some(Frame::new(captured_at, detection)))
    }

    fn name(&self) -> &'static str {
        "snapshot-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ManualClock, Timestamp};
    use crate::landmark::Finger;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("shared-mem-{}.txt", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn missing_file_means_no_hand() {
        let mut reader = SnapshotFileReader::new(temp_path(), Arc::new(ManualClock::default()))
            .with_poll_interval(Duration::from_millis(1));
        let frame = reader.read().await.unwrap().unwrap();
        assert_eq!(frame.detection(), &DetectorResult::NoHand);
    }

    #[tokio::test]
    async fn picks_up_rewrites_between_polls() {
        let path = temp_path();
        let clock = Arc::new(ManualClock::new(Timestamp::from_millis(10)));
        let mut reader = SnapshotFileReader::new(&path, clock.clone())
            .with_poll_interval(Duration::from_millis(1));

        tokio::fs::write(&path, "{\n\tTHUMB:\tX:1 Y:2\n\tINDEX:\tX:3 Y:4\n}\n")
            .await
            .unwrap();
        let first = reader.read().await.unwrap().unwrap();
        assert_eq!(first.captured_at(), Timestamp::from_millis(10));
        assert_eq!(
            first.detection().snapshot().unwrap().get(Finger::Index),
            Some((3, 4))
        );

        clock.advance(Duration::from_millis(50));
        tokio::fs::write(&path, "{\n\tTHUMB:\tX:5 Y:6\n}\n").await.unwrap();
        let second = reader.read().await.unwrap().unwrap();
        assert_eq!(second.captured_at(), Timestamp::from_millis(60));
        assert_eq!(
            second.detection().snapshot().unwrap().get(Finger::Thumb),
            Some((5, 6))
        );

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn half_written_files_are_recoverable_errors() {
        let path = temp_path();
        let mut reader = SnapshotFileReader::new(&path, Arc::new(ManualClock::default()))
            .with_poll_interval(Duration::from_millis(1));
        tokio::fs::write(&path, "{\n\tTHUMB:\tX:1").await.unwrap();

        let err = reader.read().await.unwrap_err();
        assert!(matches!(err, SourceError::Snapshot(_)));
        assert!(err.is_recoverable());

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
