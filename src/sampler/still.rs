//! Still-image output.
//!
//! Selected frames leave the sampler through the [`StillSink`] trait.
//! The production sink writes image files with OpenCV; the in-memory
//! sink records target paths for tests.

use opencv::{core, imgcodecs};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::capture::{frame_to_mat, Frame};

/// Failure to write one still image.
#[derive(Debug, Error)]
#[error("failed to write still image {path}: {reason}")]
pub struct StillError {
    /// Target image path.
    pub path: PathBuf,
    /// Failure description.
    pub reason: String,
}

/// Trait for still-image writers.
pub trait StillSink {
    /// Writes one frame as an image file at `path`.
    fn write_still(&self, path: &Path, frame: &Frame) -> Result<(), StillError>;
}

/// Still sink writing image files with OpenCV.
#[derive(Debug, Default)]
pub struct ImageFileSink;

impl ImageFileSink {
    /// Creates a new sink.
    pub fn new() -> Self {
        Self
    }
}

impl StillSink for ImageFileSink {
    fn write_still(&self, path: &Path, frame: &Frame) -> Result<(), StillError> {
        let mat = frame_to_mat(frame).map_err(|e| StillError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let target = path.to_string_lossy();
        let written = imgcodecs::imwrite(&target, &mat, &core::Vector::new()).map_err(|e| {
            StillError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        if !written {
            return Err(StillError {
                path: path.to_path_buf(),
                reason: "encoder rejected the image".into(),
            });
        }
        Ok(())
    }
}

/// Mock sink recording still paths in memory.
#[derive(Debug, Default)]
pub struct MemoryStillSink {
    written: Mutex<Vec<PathBuf>>,
    fail: bool,
}

impl MemoryStillSink {
    /// Creates a sink that accepts every still.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that rejects every still.
    pub fn failing() -> Self {
        Self {
            written: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Returns every path written so far.
    pub fn written(&self) -> Vec<PathBuf> {
        match self.written.lock() {
            Ok(written) => written.clone(),
            Err(_) => Vec::new(),
        }
    }
}

impl StillSink for MemoryStillSink {
    fn write_still(&self, path: &Path, _frame: &Frame) -> Result<(), StillError> {
        if self.fail {
            return Err(StillError {
                path: path.to_path_buf(),
                reason: "rejected by mock sink".into(),
            });
        }
        if let Ok(mut written) = self.written.lock() {
            written.push(path.to_path_buf());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_paths() {
        let sink = MemoryStillSink::new();
        let frame = Frame::new(vec![0u8; 8 * 8 * 3], 8, 8, 1);

        sink.write_still(Path::new("out/a_frame_0000.jpg"), &frame)
            .unwrap();
        sink.write_still(Path::new("out/a_frame_0005.jpg"), &frame)
            .unwrap();

        assert_eq!(
            sink.written(),
            vec![
                PathBuf::from("out/a_frame_0000.jpg"),
                PathBuf::from("out/a_frame_0005.jpg"),
            ]
        );
    }

    #[test]
    fn test_failing_sink_rejects() {
        let sink = MemoryStillSink::failing();
        let frame = Frame::new(vec![0u8; 8 * 8 * 3], 8, 8, 1);

        assert!(sink
            .write_still(Path::new("out/a_frame_0000.jpg"), &frame)
            .is_err());
        assert!(sink.written().is_empty());
    }
}
