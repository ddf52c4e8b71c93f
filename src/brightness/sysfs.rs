use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::brightness::BrightnessControl;
use crate::error::BrightnessError;

pub const BACKLIGHT_CLASS_DIR: &str = "/sys/class/backlight";

/// A Linux backlight device, e.g. `/sys/class/backlight/intel_backlight`.
///
/// Raw values are scaled against `max_brightness`, which is read once when
/// the device is opened.
#[derive(Debug, Clone)]
pub struct SysfsBacklight {
    dir: PathBuf,
    name: String,
    max_raw: u64,
}

impl SysfsBacklight {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, BrightnessError> {
        let dir = dir.into();
        let max_raw = read_value(&dir.join("max_brightness"))?;
        if max_raw == 0 {
            return Err(BrightnessError::InvalidValue(format!(
                "{}: max_brightness is 0",
                dir.display()
            )));
        }
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        info!("Using backlight {} (max {})", name, max_raw);
        Ok(Self { dir, name, max_raw })
    }

    /// Opens the first device found under `class_dir`, in name order.
    pub fn discover(class_dir: impl AsRef<Path>) -> Result<Self, BrightnessError> {
        let class_dir = class_dir.as_ref();
        let entries = std::fs::read_dir(class_dir).map_err(|source| BrightnessError::Io {
            path: class_dir.to_path_buf(),
            source,
        })?;
        let mut devices: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.join("max_brightness").exists())
            .collect();
        devices.sort();
        match devices.into_iter().next() {
            Some(dir) => Self::open(dir),
            None => Err(BrightnessError::NoDevice(class_dir.to_path_buf())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl BrightnessControl for SysfsBacklight {
    fn name(&self) -> &str {
        &self.name
    }

    fn brightness(&mut self) -> Result<u8, BrightnessError> {
        let raw = read_value(&self.dir.join("brightness"))?;
        let max = u128::from(self.max_raw);
        let percent = (u128::from(raw.min(self.max_raw)) * 100 + max / 2) / max;
        Ok(percent as u8)
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), BrightnessError> {
        if percent > 100 {
            return Err(BrightnessError::InvalidValue(percent.to_string()));
        }
        // At most max_raw, so it fits back into u64.
        let raw = ((u128::from(percent) * u128::from(self.max_raw) + 50) / 100) as u64;
        let path = self.dir.join("brightness");
        debug!("Writing raw brightness {} to {}", raw, path.display());
        std::fs::write(&path, raw.to_string()).map_err(|source| BrightnessError::Io { path, source })
    }
}

fn read_value(path: &Path) -> Result<u64, BrightnessError> {
    let contents = std::fs::read_to_string(path).map_err(|source| BrightnessError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    contents
        .trim()
        .parse()
        .map_err(|_| BrightnessError::InvalidValue(format!("{}: {}", path.display(), contents.trim())))
}
