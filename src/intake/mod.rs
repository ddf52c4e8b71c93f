//! Frame sources standing in for the external hand detector.

pub mod json_lines;
pub mod reader;
pub mod snapshot_file;

pub use json_lines::JsonLinesReader;
pub use reader::FrameReader;
pub use snapshot_file::SnapshotFileReader;
