//! In-memory frame accumulation.
//!
//! One buffer collects the frames of the segment currently being
//! captured. Only the capture loop touches it: appends while filling,
//! and a single ownership-transferring handoff once full.

use chrono::{DateTime, Local};

use crate::capture::Frame;

/// Insertion-ordered frame sequence with a segment-start timestamp.
pub struct FrameBuffer {
    /// Buffered frames, in capture order.
    frames: Vec<Frame>,
    /// Wall-clock time the current segment started.
    started_at: DateTime<Local>,
}

impl FrameBuffer {
    /// Creates an empty buffer whose segment starts at `started_at`.
    pub fn new(started_at: DateTime<Local>) -> Self {
        Self {
            frames: Vec::new(),
            started_at,
        }
    }

    /// Appends one captured frame.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Returns the number of buffered frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if no frames are buffered.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns the segment-start timestamp.
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Hands off the buffered frames and restarts the buffer.
    ///
    /// Moves the frame sequence out by value and stamps the buffer
    /// with `new_start`, returning the frames together with the start
    /// timestamp of the segment they belong to. The buffer is empty
    /// with count zero when this returns, so the capture loop can
    /// append the next frame immediately; the handed-off frames are
    /// owned exclusively by the caller.
    pub fn take(&mut self, new_start: DateTime<Local>) -> (Vec<Frame>, DateTime<Local>) {
        let frames = std::mem::take(&mut self.frames);
        let started_at = std::mem::replace(&mut self.started_at, new_start);
        (frames, started_at)
    }
}
