//! Video input and frame handling.
//!
//! This module provides abstractions for pulling decoded frames out of
//! a video source, whether a live network stream or a recorded file.
//! Sources sit behind the [`FrameSource`] trait, so the recorder and
//! the sampler never depend on a particular backend.

mod config;
mod frame;
mod source;
mod video;

pub use config::{ConfigError, FileConfig, RecorderConfig};
pub use frame::Frame;
pub use source::{FrameSource, MockOpener, MockSource, SourceError, SourceOpener};
pub use video::{VideoCaptureSource, VideoFileOpener};

pub(crate) use video::frame_to_mat;
