//! Segmentation core.
//!
//! Turns a continuous stream of frames into time-bounded container
//! files: the capture loop fills a [`FrameBuffer`], hands completed
//! buffers to the [`EncodePool`] as [`SegmentJob`]s, and resumes
//! capturing without waiting for encoding to finish.

mod buffer;
mod naming;
mod pool;
mod recorder;
mod writer;

pub use buffer::FrameBuffer;
pub use naming::{segment_path, TIMESTAMP_FORMAT};
pub use pool::EncodePool;
pub use recorder::{RecordError, Recorder, RecordingSummary};
pub use writer::{EncodeError, MockSegmentSink, SegmentJob, SegmentSink, VideoFileSink};
