use std::path::PathBuf;
use thiserror::Error;

use crate::landmark::Finger;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Source Error: {0}")]
    Source(#[from] SourceError),
    #[error("Brightness Error: {0}")]
    Brightness(#[from] BrightnessError),
    #[error("Pipeline Error: {0}")]
    Pipeline(String),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

// Landmark geometry errors. Always per-frame and recoverable.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Snapshot is missing landmark {0}")]
    MissingLandmark(Finger),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Unknown landmark label '{0}'")]
    UnknownLabel(String),
    #[error("Missing {field} field for {finger}")]
    MissingField { finger: Finger, field: &'static str },
    #[error("Invalid {field} coordinate '{value}' for {finger}")]
    InvalidCoordinate {
        finger: Finger,
        field: &'static str,
        value: String,
    },
    #[error("Malformed snapshot line: {0}")]
    MalformedLine(String),
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read input: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse record on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Failed to parse snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

impl SourceError {
    /// Whether the source can keep producing frames after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SourceError::Read(_))
    }
}

#[derive(Error, Debug)]
pub enum BrightnessError {
    #[error("No backlight device found under {0}")]
    NoDevice(PathBuf),
    #[error("Failed to access backlight {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid brightness value '{0}'")]
    InvalidValue(String),
    #[error("Brightness controller lock was poisoned")]
    Poisoned,
    #[error("Brightness task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
