//! Continuous stream capture and segmentation.
//!
//! `segcap` records a live video stream into time-bounded segment files,
//! and later decimates recorded segments into still-image samples at a
//! rate-dependent stride.
//!
//! # Architecture
//!
//! Two independently runnable pipelines:
//!
//! ```text
//! stream ──► capture loop ──► frame buffer ──handoff──► encode pool ──► segment files
//!                                                                            │
//!                      sampler (stride policy → stills) ◄───────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Ownership transfer at handoff**: the capture loop moves each full
//!   frame buffer into an encode job, so producer and writer never share
//!   a buffer instance and no lock guards buffer access.
//! - **Bounded encode concurrency**: segments are encoded by a fixed
//!   worker pool behind a bounded queue, drained and joined on shutdown.
//! - **Trait seams for IO**: frame sources, segment sinks, still sinks,
//!   and event reporting are traits, so every pipeline runs against
//!   mocks in tests.
//! - **Fatal vs isolated failures**: a dead stream ends a recording run;
//!   a bad file or frame never ends a sampling batch.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//!
//! use segcap::{
//!     capture::{MockSource, RecorderConfig},
//!     event::MemorySink,
//!     segment::{MockSegmentSink, Recorder},
//! };
//!
//! // Ten frames per second, two-second segments: handoff every 20 frames.
//! let source = MockSource::new(10.0, 64, 48).with_frame_limit(45);
//! let config = RecorderConfig {
//!     source: "mock://demo".into(),
//!     output_dir: std::env::temp_dir(),
//!     segment_secs: 2,
//!     ..RecorderConfig::default()
//! };
//!
//! let sink = Arc::new(MockSegmentSink::new());
//! let events = Arc::new(MemorySink::new());
//! let stop = Arc::new(AtomicBool::new(false));
//!
//! let recorder = Recorder::new(source, config, events, stop);
//! let summary = recorder.run(sink.clone()).unwrap();
//!
//! // 45 frames yield two full segments; the trailing 5 are discarded.
//! assert_eq!(summary.segments, 2);
//! assert_eq!(sink.written().len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod event;
pub mod sampler;
pub mod segment;

// Re-export commonly used types at crate root
pub use capture::{Frame, FrameSource, MockSource, RecorderConfig, SourceError};
pub use event::{Event, EventSink, LogSink, MemorySink};
pub use sampler::{Sampler, SamplerConfig};
pub use segment::{FrameBuffer, Recorder, RecordingSummary, SegmentJob};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
