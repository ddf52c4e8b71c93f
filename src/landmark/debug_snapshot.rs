//! Plain-text fingertip dump, rewritten every frame.
//!
//! The format is a brace-delimited block with one tab-indented line per
//! fingertip:
//!
//! ```text
//! {
//! 	THUMB:	X:120 Y:200
//! 	INDEX:	X:130 Y:210
//! }
//! ```
//!
//! Other processes poll this file as a poor man's shared memory, so the
//! parser here accepts exactly what [`format_snapshot`] writes plus some
//! whitespace slack.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::SnapshotError;
use crate::landmark::{DetectorResult, Finger, LandmarkPoint, LandmarkSnapshot};

pub fn format_snapshot(snapshot: &LandmarkSnapshot) -> String {
    let mut output = String::from("{\n");
    for point in snapshot.points() {
        // Writing into a String cannot fail.
        let _ = writeln!(output, "\t{}:\tX:{} Y:{}", point.finger, point.x, point.y);
    }
    output.push_str("}\n");
    output
}

pub fn parse_snapshot(text: &str) -> Result<DetectorResult, SnapshotError> {
    let mut points = Vec::with_capacity(Finger::ALL.len());
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line == "{" || line == "}" {
            continue;
        }
        points.push(parse_line(line)?);
    }
    Ok(DetectorResult::from_snapshot(points.into_iter().collect()))
}

fn parse_line(line: &str) -> Result<LandmarkPoint, SnapshotError> {
    let (label, coordinates) = line
        .split_once(':')
        .ok_or_else(|| SnapshotError::MalformedLine(line.to_string()))?;
    let finger = Finger::from_label(label.trim())
        .ok_or_else(|| SnapshotError::UnknownLabel(label.trim().to_string()))?;

    let mut x = None;
    let mut y = None;
    for token in coordinates.split_whitespace() {
        if let Some(value) = token.strip_prefix("X:") {
            x = Some(parse_coordinate(finger, "X", value)?);
        } else if let Some(value) = token.strip_prefix("Y:") {
            y = Some(parse_coordinate(finger, "Y", value)?);
        }
    }

    Ok(LandmarkPoint {
        finger,
        x: x.ok_or(SnapshotError::MissingField { finger, field: "X" })?,
        y: y.ok_or(SnapshotError::MissingField { finger, field: "Y" })?,
    })
}

fn parse_coordinate(finger: Finger, field: &'static str, value: &str) -> Result<i32, SnapshotError> {
    value
        .parse()
        .map_err(|_| SnapshotError::InvalidCoordinate {
            finger,
            field,
            value: value.to_string(),
        })
}

/// Overwrites a text file with the latest snapshot.
#[derive(Debug, Clone)]
pub struct DebugSnapshotWriter {
    path: PathBuf,
}

impl DebugSnapshotWriter {
    /// Truncates `path` so readers never see a hand from a previous run.
    pub async fn create(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        tokio::fs::write(&path, b"").await?;
        tracing::info!("Writing debug snapshots to {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write(&self, snapshot: &LandmarkSnapshot) -> std::io::Result<()> {
        tokio::fs::write(&self.path, format_snapshot(snapshot)).await
    }
}
