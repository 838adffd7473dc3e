//! Segment encoding.
//!
//! A [`SegmentJob`] carries everything one encode needs: the frames,
//! the target path, and the encoding parameters. Jobs are written
//! through the [`SegmentSink`] trait; the production sink encodes a
//! container file with OpenCV, the mock records jobs for tests.

use chrono::{DateTime, Local};
use opencv::{core, prelude::*, videoio};
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

use crate::capture::{frame_to_mat, Frame};

/// Errors that can occur while encoding a segment.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to open container writer {0}")]
    OpenFailed(String),
    #[error("failed to encode frame {index}: {reason}")]
    WriteFailed { index: usize, reason: String },
    #[error("encode queue is closed")]
    QueueClosed,
}

/// One completed segment, ready to encode.
///
/// Owns its frame sequence outright; nothing else references these
/// frames once the capture loop hands the job off.
pub struct SegmentJob {
    /// Target container path.
    pub path: PathBuf,
    /// Frames in capture order.
    pub frames: Vec<Frame>,
    /// Frame rate to encode at.
    pub frame_rate: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Wall-clock start of the covered window.
    pub started_at: DateTime<Local>,
    /// Wall-clock end of the covered window.
    pub ended_at: DateTime<Local>,
}

impl std::fmt::Debug for SegmentJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentJob")
            .field("path", &self.path)
            .field("frames", &self.frames.len())
            .field("frame_rate", &self.frame_rate)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Trait for segment writers.
///
/// One call encodes one whole segment: open the container, write every
/// frame in order, close. Implementations are shared across encode
/// workers and must not keep per-job state.
pub trait SegmentSink: Send + Sync {
    /// Writes the job's frames to its target path.
    fn write_segment(&self, job: &SegmentJob) -> Result<(), EncodeError>;
}

/// Segment sink encoding MP4 container files with OpenCV.
#[derive(Debug, Default)]
pub struct VideoFileSink;

impl VideoFileSink {
    /// Creates a new sink.
    pub fn new() -> Self {
        Self
    }
}

impl SegmentSink for VideoFileSink {
    fn write_segment(&self, job: &SegmentJob) -> Result<(), EncodeError> {
        let path = job.path.to_string_lossy().into_owned();
        let fourcc = videoio::VideoWriter::fourcc('m', 'p', '4', 'v')
            .map_err(|e| EncodeError::OpenFailed(format!("{path}: {e}")))?;
        let size = core::Size::new(job.width as i32, job.height as i32);

        let mut writer = videoio::VideoWriter::new(&path, fourcc, job.frame_rate, size, true)
            .map_err(|e| EncodeError::OpenFailed(format!("{path}: {e}")))?;
        let opened = writer
            .is_opened()
            .map_err(|e| EncodeError::OpenFailed(format!("{path}: {e}")))?;
        if !opened {
            return Err(EncodeError::OpenFailed(path));
        }

        for (index, frame) in job.frames.iter().enumerate() {
            let mat = frame_to_mat(frame).map_err(|e| EncodeError::WriteFailed {
                index,
                reason: e.to_string(),
            })?;
            writer.write(&mat).map_err(|e| EncodeError::WriteFailed {
                index,
                reason: e.to_string(),
            })?;
        }

        writer.release().map_err(|e| EncodeError::WriteFailed {
            index: job.frames.len(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// Mock sink recording `(path, frame count)` per written segment.
#[derive(Debug, Default)]
pub struct MockSegmentSink {
    written: Mutex<Vec<(PathBuf, usize)>>,
    fail: bool,
}

impl MockSegmentSink {
    /// Creates a sink that accepts every job.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that rejects every job.
    pub fn failing() -> Self {
        Self {
            written: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Returns `(path, frame count)` for every segment written so far.
    pub fn written(&self) -> Vec<(PathBuf, usize)> {
        match self.written.lock() {
            Ok(written) => written.clone(),
            Err(_) => Vec::new(),
        }
    }
}

impl SegmentSink for MockSegmentSink {
    fn write_segment(&self, job: &SegmentJob) -> Result<(), EncodeError> {
        if self.fail {
            return Err(EncodeError::OpenFailed(
                job.path.to_string_lossy().into_owned(),
            ));
        }
        if let Ok(mut written) = self.written.lock() {
            written.push((job.path.clone(), job.frames.len()));
        }
        Ok(())
    }
}
