//! The continuous capture loop.
//!
//! One recorder owns one open stream session and the live frame
//! buffer exclusively. It reads frames in a tight loop, hands full
//! buffers to the encode pool, and keeps capturing; a dead source or
//! a user interrupt ends the run, and the pool is drained before the
//! run returns.

use chrono::Local;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use super::buffer::FrameBuffer;
use super::naming::segment_path;
use super::pool::EncodePool;
use super::writer::{SegmentJob, SegmentSink};
use crate::capture::{FrameSource, RecorderConfig, SourceError};
use crate::event::{Event, EventSink};

/// Frame rate used when the source reports an unusable value.
const FALLBACK_FRAME_RATE: f64 = 25.0;
/// Frame dimensions used when the source reports unusable values.
const FALLBACK_FRAME_SIZE: (u32, u32) = (640, 480);

/// Errors that end a recording run before capture starts.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("failed to create output directory {path}: {reason}")]
    OutputDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// Failure description.
        reason: String,
    },
}

/// Totals reported when a recording run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingSummary {
    /// Frames captured over the whole run.
    pub total_frames: u64,
    /// Segments handed off for encoding.
    pub segments: u64,
}

/// Long-running capture/segmentation task.
///
/// Owns the [`FrameSource`] and the live [`FrameBuffer`] exclusively;
/// no other task reads or writes either. Cancellation is cooperative:
/// the shared flag is checked at the top of every iteration, so
/// cancellation latency is bounded by one frame read.
pub struct Recorder<S: FrameSource> {
    source: S,
    config: RecorderConfig,
    events: Arc<dyn EventSink>,
    stop: Arc<AtomicBool>,
}

impl<S: FrameSource> Recorder<S> {
    /// Creates a recorder over an unopened source.
    pub fn new(
        source: S,
        config: RecorderConfig,
        events: Arc<dyn EventSink>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            config,
            events,
            stop,
        }
    }

    /// Runs the capture loop until the source dies or `stop` is set.
    ///
    /// Opening the source is fatal on failure, with no retry. Encode
    /// failures are isolated per segment and never end the run. On
    /// return the source is closed and every queued segment has been
    /// encoded; frames short of a full segment are discarded.
    pub fn run(mut self, sink: Arc<dyn SegmentSink>) -> Result<RecordingSummary, RecordError> {
        std::fs::create_dir_all(&self.config.output_dir).map_err(|e| RecordError::OutputDir {
            path: self.config.output_dir.clone(),
            reason: e.to_string(),
        })?;
        self.source.open()?;

        let frame_rate = normalize_rate(self.source.frame_rate());
        let (width, height) = normalize_size(self.source.frame_size());
        let frames_per_segment =
            ((frame_rate * self.config.segment_secs as f64) as usize).max(1);

        let pool = EncodePool::new(
            self.config.encode_workers,
            self.config.max_in_flight,
            sink,
            Arc::clone(&self.events),
        );

        self.events.emit(Event::RecordingStarted {
            address: self.config.source.clone(),
            frame_rate,
            width,
            height,
        });

        let heartbeat_every = Duration::from_secs(self.config.heartbeat_secs.max(1));
        let mut last_heartbeat = Instant::now();
        let mut buffer = FrameBuffer::new(Local::now());
        let mut total_frames: u64 = 0;
        let mut segments: u64 = 0;

        loop {
            // User cancellation is a clean shutdown, not an error.
            if self.stop.load(Ordering::Relaxed) {
                break;
            }

            let frame = match self.source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    self.events.emit(Event::SourceLost {
                        reason: "stream ended".into(),
                    });
                    break;
                }
                Err(e) => {
                    self.events.emit(Event::SourceLost {
                        reason: e.to_string(),
                    });
                    break;
                }
            };

            buffer.push(frame);
            total_frames += 1;

            // Wall-clock heartbeat, independent of frame timing.
            if last_heartbeat.elapsed() >= heartbeat_every {
                self.events.emit(Event::Heartbeat {
                    buffered_frames: buffer.len(),
                    total_frames,
                });
                last_heartbeat = Instant::now();
            }

            if buffer.len() >= frames_per_segment {
                let ended_at = Local::now();
                let (frames, started_at) = buffer.take(ended_at);
                let path = segment_path(
                    &self.config.output_dir,
                    started_at,
                    ended_at,
                    &self.config.container_ext,
                );

                self.events.emit(Event::SegmentQueued {
                    path: path.clone(),
                    frames: frames.len(),
                });

                let job = SegmentJob {
                    path: path.clone(),
                    frames,
                    frame_rate,
                    width,
                    height,
                    started_at,
                    ended_at,
                };
                match pool.submit(job) {
                    Ok(()) => segments += 1,
                    Err(e) => self.events.emit(Event::SegmentFailed {
                        path,
                        reason: e.to_string(),
                    }),
                }
            }
        }

        self.source.close();
        pool.drain();

        self.events.emit(Event::RecordingStopped {
            total_frames,
            segments,
        });
        Ok(RecordingSummary {
            total_frames,
            segments,
        })
    }
}

fn normalize_rate(reported: f64) -> f64 {
    if reported.is_finite() && reported > 0.0 {
        reported
    } else {
        FALLBACK_FRAME_RATE
    }
}

fn normalize_size(reported: (u32, u32)) -> (u32, u32) {
    if reported.0 == 0 || reported.1 == 0 {
        FALLBACK_FRAME_SIZE
    } else {
        reported
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::MockSource;
    use crate::event::MemorySink;
    use crate::segment::writer::MockSegmentSink;

    fn config(segment_secs: u64) -> RecorderConfig {
        RecorderConfig {
            source: "mock://stream".into(),
            output_dir: std::env::temp_dir(),
            segment_secs,
            ..RecorderConfig::default()
        }
    }

    fn run(
        source: MockSource,
        segment_secs: u64,
        sink: Arc<MockSegmentSink>,
        events: Arc<MemorySink>,
        stop: Arc<AtomicBool>,
    ) -> RecordingSummary {
        Recorder::new(source, config(segment_secs), events, stop)
            .run(sink)
            .unwrap()
    }

    #[test]
    fn test_handoff_every_rate_times_duration() {
        let sink = Arc::new(MockSegmentSink::new());
        let events = Arc::new(MemorySink::new());
        let stop = Arc::new(AtomicBool::new(false));

        // 10 fps, 2 s segments: handoff every 20 frames; 45 frames
        // yield two segments and five discarded frames.
        let source = MockSource::new(10.0, 64, 48).with_frame_limit(45);
        let summary = run(source, 2, sink.clone(), events.clone(), stop);

        assert_eq!(summary.total_frames, 45);
        assert_eq!(summary.segments, 2);

        let written = sink.written();
        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|(_, frames)| *frames == 20));
        assert_eq!(events.count(|e| matches!(e, Event::SegmentQueued { .. })), 2);
    }

    #[test]
    fn test_cadence_across_rates() {
        for (rate, secs, frames, expected_segments) in
            [(5.0, 1, 17, 3), (3.0, 4, 25, 2), (25.0, 1, 25, 1)]
        {
            let sink = Arc::new(MockSegmentSink::new());
            let events = Arc::new(MemorySink::new());
            let stop = Arc::new(AtomicBool::new(false));

            let source = MockSource::new(rate, 16, 16).with_frame_limit(frames);
            let summary = run(source, secs, sink.clone(), events, stop);

            assert_eq!(summary.segments, expected_segments, "rate {rate} secs {secs}");
            let per_segment = (rate * secs as f64) as usize;
            assert!(sink
                .written()
                .iter()
                .all(|(_, frames)| *frames == per_segment));
        }
    }

    #[test]
    fn test_fallback_rate_when_unreported() {
        let sink = Arc::new(MockSegmentSink::new());
        let events = Arc::new(MemorySink::new());
        let stop = Arc::new(AtomicBool::new(false));

        // Rate 0 falls back to 25 fps: handoff every 25 frames at 1 s.
        let source = MockSource::new(0.0, 64, 48).with_frame_limit(50);
        let summary = run(source, 1, sink.clone(), events.clone(), stop);

        assert_eq!(summary.segments, 2);
        assert!(events.events().iter().any(|e| matches!(
            e,
            Event::RecordingStarted { frame_rate, .. } if *frame_rate == FALLBACK_FRAME_RATE
        )));
    }

    #[test]
    fn test_cancellation_is_clean() {
        let sink = Arc::new(MockSegmentSink::new());
        let events = Arc::new(MemorySink::new());
        let stop = Arc::new(AtomicBool::new(true));

        let source = MockSource::new(10.0, 64, 48);
        let summary = run(source, 2, sink, events.clone(), stop);

        assert_eq!(summary.total_frames, 0);
        assert_eq!(events.count(|e| matches!(e, Event::SourceLost { .. })), 0);
        assert_eq!(
            events.count(|e| matches!(e, Event::RecordingStopped { .. })),
            1
        );
    }

    #[test]
    fn test_read_failure_ends_run() {
        let sink = Arc::new(MockSegmentSink::new());
        let events = Arc::new(MemorySink::new());
        let stop = Arc::new(AtomicBool::new(false));

        let source = MockSource::new(10.0, 64, 48).with_failure_at(5);
        let summary = run(source, 2, sink, events.clone(), stop);

        assert_eq!(summary.total_frames, 5);
        assert_eq!(summary.segments, 0);
        assert_eq!(events.count(|e| matches!(e, Event::SourceLost { .. })), 1);
    }

    #[test]
    fn test_encode_failure_is_isolated() {
        let sink = Arc::new(MockSegmentSink::failing());
        let events = Arc::new(MemorySink::new());
        let stop = Arc::new(AtomicBool::new(false));

        let source = MockSource::new(10.0, 64, 48).with_frame_limit(25);
        let summary = Recorder::new(source, config(2), events.clone(), stop)
            .run(sink)
            .unwrap();

        // The segment fails in the worker; the run still completes.
        assert_eq!(summary.segments, 1);
        assert_eq!(
            events.count(|e| matches!(e, Event::SegmentFailed { .. })),
            1
        );
    }
}
