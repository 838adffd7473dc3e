//! Frame source abstraction.
//!
//! This module provides a trait-based abstraction over video input,
//! allowing both real stream/file backends and mock implementations
//! for testing. Bounded retry on transient read failures is an
//! extension point behind the same trait; current sources treat a
//! failed read as the end of the run.

use super::Frame;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while opening or reading a video source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open video source {0}")]
    OpenFailed(String),
    #[error("failed to read frame: {0}")]
    ReadFailed(String),
    #[error("source not open")]
    NotOpen,
}

/// Trait for pull-based video sources.
///
/// A source hands out decoded frames one at a time. `Ok(None)` means
/// the source has no more frames (a finished file, or a live stream
/// that stopped producing); `Err` means the backend failed. Callers
/// decide which of the two is fatal.
pub trait FrameSource {
    /// Opens the source and reads back its reported geometry.
    fn open(&mut self) -> Result<(), SourceError>;

    /// Reads the next decoded frame.
    fn read_frame(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Returns the frame rate reported by the source, `0.0` if unknown.
    fn frame_rate(&self) -> f64;

    /// Returns the reported frame dimensions, `(0, 0)` if unknown.
    fn frame_size(&self) -> (u32, u32);

    /// Checks whether the source is currently open.
    fn is_open(&self) -> bool;

    /// Closes the source and releases backend resources.
    fn close(&mut self);
}

/// Opens recorded video files as ready-to-read frame sources.
///
/// The sampler goes through this seam so a batch can be driven with
/// synthetic sources in tests.
pub trait SourceOpener {
    /// Opens the file at `path` and returns it already opened.
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, SourceError>;
}

/// Mock source producing synthetic frames for testing.
#[derive(Debug)]
pub struct MockSource {
    frame_rate: f64,
    width: u32,
    height: u32,
    frame_limit: Option<u64>,
    fail_at: Option<u64>,
    sequence: u64,
    open: bool,
}

impl MockSource {
    /// Creates a closed mock source reporting the given geometry.
    pub fn new(frame_rate: f64, width: u32, height: u32) -> Self {
        Self {
            frame_rate,
            width,
            height,
            frame_limit: None,
            fail_at: None,
            sequence: 0,
            open: false,
        }
    }

    /// Ends the stream (`Ok(None)`) after `limit` frames.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    /// Fails the read (`Err`) once `at` frames have been produced.
    pub fn with_failure_at(mut self, at: u64) -> Self {
        self.fail_at = Some(at);
        self
    }
}

impl FrameSource for MockSource {
    fn open(&mut self) -> Result<(), SourceError> {
        self.open = true;
        self.sequence = 0;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        if !self.open {
            return Err(SourceError::NotOpen);
        }
        if self.fail_at == Some(self.sequence) {
            return Err(SourceError::ReadFailed("simulated read failure".into()));
        }
        if let Some(limit) = self.frame_limit {
            if self.sequence >= limit {
                return Ok(None);
            }
        }

        // Deterministic pattern mixed with the sequence number, only
        // for exercising frame handling.
        let byte_count = (self.width as usize) * (self.height as usize) * 3;
        let pixels: Vec<u8> = (0..byte_count)
            .map(|i| ((i as u64 ^ self.sequence) % 256) as u8)
            .collect();

        self.sequence += 1;
        Ok(Some(Frame::new(
            pixels,
            self.width,
            self.height,
            self.sequence,
        )))
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }
}

/// Mock opener handing out [`MockSource`]s, with per-path failures.
#[derive(Debug)]
pub struct MockOpener {
    frame_rate: f64,
    frames_per_video: u64,
    failing: Vec<PathBuf>,
}

impl MockOpener {
    /// Creates an opener whose sources report `frame_rate` and end
    /// after `frames_per_video` frames.
    pub fn new(frame_rate: f64, frames_per_video: u64) -> Self {
        Self {
            frame_rate,
            frames_per_video,
            failing: Vec::new(),
        }
    }

    /// Makes opening the given path fail, for partial-failure tests.
    pub fn with_failing(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing.push(path.into());
        self
    }
}

impl SourceOpener for MockOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, SourceError> {
        if self.failing.iter().any(|p| p == path) {
            return Err(SourceError::OpenFailed(path.display().to_string()));
        }
        let mut source =
            MockSource::new(self.frame_rate, 64, 48).with_frame_limit(self.frames_per_video);
        source.open()?;
        Ok(Box::new(source))
    }
}
