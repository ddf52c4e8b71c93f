use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::gesture::{CursorMapper, PinchConfig, Region};

/// Runtime configuration.
///
/// Loaded from built-in defaults, then an optional TOML file, then
/// `PINCH_`-prefixed environment variables using `__` between sections
/// (e.g. `PINCH_GESTURE__MIN_HOLD_MS=1500`). Command-line flags are
/// applied on top by the binary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub frame_buffer_size: usize,
    pub gesture: GestureSettings,
    pub detector: DetectorSettings,
    pub source: SourceSettings,
    pub cursor: CursorMapper,
    pub brightness: BrightnessSettings,
    /// Where to dump the fingertip block every frame, if anywhere.
    pub debug_snapshot_path: Option<PathBuf>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            frame_buffer_size: 60,
            gesture: GestureSettings::default(),
            detector: DetectorSettings::default(),
            source: SourceSettings::default(),
            cursor: CursorMapper::default(),
            brightness: BrightnessSettings::default(),
            debug_snapshot_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    pub engage_threshold_px: f64,
    pub min_hold_ms: u64,
    pub region: Option<Region>,
}

impl Default for GestureSettings {
    fn default() -> Self {
        let defaults = PinchConfig::default();
        Self {
            engage_threshold_px: defaults.engage_threshold_px,
            min_hold_ms: defaults.min_hold.as_millis() as u64,
            region: defaults.region,
        }
    }
}

impl GestureSettings {
    pub fn pinch_config(&self) -> PinchConfig {
        PinchConfig {
            engage_threshold_px: self.engage_threshold_px,
            min_hold: Duration::from_millis(self.min_hold_ms),
            region: self.region,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Hands scored below this are ignored.
    pub min_confidence: f32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Polling period for snapshot-file input.
    pub poll_interval_ms: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
        }
    }
}

impl SourceSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BrightnessSettings {
    /// Backlight device directory. Discovered under /sys/class/backlight when unset.
    pub backlight_dir: Option<PathBuf>,
    /// Keep brightness in memory instead of touching the display.
    pub dry_run: bool,
    /// Upper bound for one brightness change, 0 for none.
    pub dispatch_timeout_ms: u64,
}

impl Default for BrightnessSettings {
    fn default() -> Self {
        Self {
            backlight_dir: None,
            dry_run: false,
            dispatch_timeout_ms: 500,
        }
    }
}

impl BrightnessSettings {
    pub fn dispatch_timeout(&self) -> Option<Duration> {
        (self.dispatch_timeout_ms > 0).then(|| Duration::from_millis(self.dispatch_timeout_ms))
    }
}

impl Configuration {
    pub const ENV_PREFIX: &'static str = "PINCH";
    pub const DEFAULT_FILE: &'static str = "pinch-brightness";

    /// Loads `path` if given (it must exist), otherwise `pinch-brightness.toml`
    /// in the working directory if present. Environment variables win over
    /// either.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(Self::DEFAULT_FILE).required(false),
        };
        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(Self::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let configuration: Configuration = settings.try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_buffer_size == 0 {
            return Err(invalid("frame_buffer_size", "must be greater than 0"));
        }

        let threshold = self.gesture.engage_threshold_px;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(invalid(
                "gesture.engage_threshold_px",
                "must be a positive number of pixels",
            ));
        }

        if let Some(region) = &self.gesture.region {
            if region.is_empty() {
                return Err(invalid(
                    "gesture.region",
                    "must contain at least one pixel (right > left + 1, bottom > top + 1)",
                ));
            }
        }

        if !(0.0..=1.0).contains(&self.detector.min_confidence) {
            return Err(invalid("detector.min_confidence", "must be between 0.0 and 1.0"));
        }

        if self.source.poll_interval_ms == 0 {
            return Err(invalid("source.poll_interval_ms", "must be greater than 0"));
        }

        if self.cursor.frame_width == 0 || self.cursor.frame_height == 0 {
            return Err(invalid("cursor", "frame dimensions must be greater than 0"));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}
