use serde::Serialize;
use std::fmt;

/// Running counters for one pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub frames: u64,
    pub no_detection: u64,
    pub skipped: u64,
    pub engaged: u64,
    pub released: u64,
    pub confirmed: u64,
    pub brightness_changes: u64,
    pub brightness_failures: u64,
    pub debug_write_failures: u64,
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames ({} without hand, {} skipped), {} pinches ({} confirmed), {} brightness changes, {} failures",
            self.frames,
            self.no_detection,
            self.skipped,
            self.released,
            self.confirmed,
            self.brightness_changes,
            self.brightness_failures
        )
    }
}
