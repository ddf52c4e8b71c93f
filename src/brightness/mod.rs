//! Display brightness side effect triggered by confirmed pinches.

pub mod memory;
pub mod service;
pub mod sysfs;

use crate::error::BrightnessError;

pub use memory::MemoryBrightness;
pub use service::{BrightnessCommand, BrightnessDispatcher, BrightnessService};
pub use sysfs::SysfsBacklight;

/// Levels at or below this count as "dark" and toggle to full brightness.
pub const DARK_THRESHOLD: u8 = 10;

/// Next level for a toggle: dark screens go to 100, everything else to 0.
pub fn toggled_level(current: u8) -> u8 {
    if current <= DARK_THRESHOLD {
        100
    } else {
        0
    }
}

/// A display whose brightness can be read and written as a percentage.
pub trait BrightnessControl: Send {
    fn name(&self) -> &str;

    fn brightness(&mut self) -> Result<u8, BrightnessError>;

    fn set_brightness(&mut self, percent: u8) -> Result<(), BrightnessError>;

    /// Flips between off and full brightness. Returns the new level.
    fn toggle(&mut self) -> Result<u8, BrightnessError> {
        let next = toggled_level(self.brightness()?);
        self.set_brightness(next)?;
        Ok(next)
    }
}
