//! OpenCV-backed video sources.
//!
//! One backend covers both inputs the crate deals with: live network
//! streams (RTSP and friends) and recorded container files. OpenCV
//! picks the decode backend itself (`CAP_ANY`).

use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::path::Path;

use super::source::{FrameSource, SourceError, SourceOpener};
use super::Frame;

/// Converts a BGR8 [`Frame`] into an OpenCV matrix.
///
/// Used by the segment writer and the still sink; the copy keeps the
/// matrix independent of the frame's lifetime.
pub(crate) fn frame_to_mat(frame: &Frame) -> Result<Mat, opencv::Error> {
    let flat = Mat::from_slice(frame.pixels())?;
    let shaped = flat.reshape(3, frame.height() as i32)?;
    shaped.try_clone()
}

/// Frame source backed by `opencv::videoio::VideoCapture`.
///
/// Holds one open connection to a stream address or a file path; the
/// reported frame rate and geometry are cached at open time.
pub struct VideoCaptureSource {
    target: String,
    capture: Option<VideoCapture>,
    frame_rate: f64,
    width: u32,
    height: u32,
    sequence: u64,
}

impl VideoCaptureSource {
    /// Creates a closed source for a live stream address.
    pub fn for_stream(address: &str) -> Self {
        Self::new(address.to_string())
    }

    /// Creates a closed source for a recorded video file.
    pub fn for_file(path: &Path) -> Self {
        Self::new(path.display().to_string())
    }

    fn new(target: String) -> Self {
        Self {
            target,
            capture: None,
            frame_rate: 0.0,
            width: 0,
            height: 0,
            sequence: 0,
        }
    }
}

impl FrameSource for VideoCaptureSource {
    fn open(&mut self) -> Result<(), SourceError> {
        let capture = VideoCapture::from_file(&self.target, videoio::CAP_ANY)
            .map_err(|e| SourceError::OpenFailed(format!("{}: {e}", self.target)))?;
        let opened = capture
            .is_opened()
            .map_err(|e| SourceError::OpenFailed(format!("{}: {e}", self.target)))?;
        if !opened {
            return Err(SourceError::OpenFailed(self.target.clone()));
        }

        self.frame_rate = capture.get(videoio::CAP_PROP_FPS).unwrap_or(0.0);
        self.width = capture
            .get(videoio::CAP_PROP_FRAME_WIDTH)
            .unwrap_or(0.0) as u32;
        self.height = capture
            .get(videoio::CAP_PROP_FRAME_HEIGHT)
            .unwrap_or(0.0) as u32;
        self.sequence = 0;
        self.capture = Some(capture);

        tracing::debug!(
            address = %self.target,
            frame_rate = self.frame_rate,
            width = self.width,
            height = self.height,
            "opened video source"
        );
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let capture = self.capture.as_mut().ok_or(SourceError::NotOpen)?;

        let mut mat = Mat::default();
        let got = capture
            .read(&mut mat)
            .map_err(|e| SourceError::ReadFailed(e.to_string()))?;
        if !got || mat.empty() {
            return Ok(None);
        }

        // Decoders occasionally hand out row-padded matrices; the pixel
        // buffer must be contiguous before it leaves the backend.
        let mat = if mat.is_continuous() {
            mat
        } else {
            mat.try_clone()
                .map_err(|e| SourceError::ReadFailed(e.to_string()))?
        };

        let pixels = mat
            .data_bytes()
            .map_err(|e| SourceError::ReadFailed(e.to_string()))?
            .to_vec();
        let width = mat.cols() as u32;
        let height = mat.rows() as u32;

        self.sequence += 1;
        Ok(Some(Frame::new(pixels, width, height, self.sequence)))
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_open(&self) -> bool {
        self.capture.is_some()
    }

    fn close(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            let _ = capture.release();
        }
    }
}

/// Opener producing [`VideoCaptureSource`]s for recorded files.
#[derive(Debug, Default)]
pub struct VideoFileOpener;

impl VideoFileOpener {
    /// Creates a new opener.
    pub fn new() -> Self {
        Self
    }
}

impl SourceOpener for VideoFileOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, SourceError> {
        let mut source = VideoCaptureSource::for_file(path);
        source.open()?;
        Ok(Box::new(source))
    }
}
