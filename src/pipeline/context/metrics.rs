use indexmap::IndexMap;
use std::fmt;
use std::time::Duration;

/// Per-stage timings collected while a frame moves through the pipeline,
/// in the order the stages ran.
#[derive(Debug, Clone, Default)]
pub struct FrameMetrics {
    stages: IndexMap<&'static str, Duration>,
}

impl FrameMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_stage(&mut self, stage: &'static str, duration: Duration) {
        self.stages.insert(stage, duration);
    }

    pub fn stage(&self, stage: &str) -> Option<Duration> {
        self.stages.get(stage).copied()
    }

    pub fn stages(&self) -> impl Iterator<Item = (&'static str, Duration)> + '_ {
        self.stages.iter().map(|(name, duration)| (*name, *duration))
    }

    pub fn total(&self) -> Duration {
        self.stages.values().sum()
    }
}

impl fmt::Display for FrameMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, duration) in self.stages() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}={:?}", name, duration)?;
            first = false;
        }
        Ok(())
    }
}
