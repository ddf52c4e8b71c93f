use tracing::info;

use crate::brightness::BrightnessControl;
use crate::error::BrightnessError;

/// In-process brightness level for dry runs.
#[derive(Debug, Clone)]
pub struct MemoryBrightness {
    level: u8,
    writes: usize,
}

impl MemoryBrightness {
    pub fn new(level: u8) -> Self {
        Self {
            level: level.min(100),
            writes: 0,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Number of successful `set_brightness` calls.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Default for MemoryBrightness {
    fn default() -> Self {
        Self::new(100)
    }
}

impl BrightnessControl for MemoryBrightness {
    fn name(&self) -> &str {
        "memory"
    }

    fn brightness(&mut self) -> Result<u8, BrightnessError> {
        Ok(self.level)
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), BrightnessError> {
        if percent > 100 {
            return Err(BrightnessError::InvalidValue(percent.to_string()));
        }
        info!("Dry run: brightness {} -> {}", self.level, percent);
        self.level = percent;
        self.writes += 1;
        Ok(())
    }
}
