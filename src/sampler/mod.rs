//! Frame sampling of recorded segments.
//!
//! Walks a folder of recorded container files and exports every
//! stride-th frame of each as a still image, one output subfolder per
//! video. Strictly single-threaded: one file at a time, one frame at
//! a time. Failures are isolated per file and per frame; a bad entry
//! never aborts the batch.

mod batch;
mod still;
mod stride;

pub use batch::{BatchReport, SampleError, Sampler, SamplerConfig, VideoReport};
pub use still::{ImageFileSink, MemoryStillSink, StillError, StillSink};
pub use stride::{stride_for_rate, HIGH_RATE_STRIDE, LOW_RATE_STRIDE};
