//! Structured lifecycle events.
//!
//! The capture and sampling pipelines report progress as typed events
//! through the [`EventSink`] trait instead of printing to the console.
//! The production sink forwards events to `tracing`; tests observe
//! pipelines through an in-memory sink. Events are advisory only and
//! never affect pipeline behavior.

use std::path::PathBuf;
use std::sync::Mutex;

/// A lifecycle notification emitted by a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A recording run opened its source and is about to capture.
    RecordingStarted {
        /// Source address the session was opened against.
        address: String,
        /// Frame rate used for segment sizing and encoding.
        frame_rate: f64,
        /// Frame width in pixels.
        width: u32,
        /// Frame height in pixels.
        height: u32,
    },
    /// Periodic liveness notification from the capture loop.
    Heartbeat {
        /// Frames currently held in the live buffer.
        buffered_frames: usize,
        /// Frames captured since the run started.
        total_frames: u64,
    },
    /// A completed buffer was handed off to the encode pool.
    SegmentQueued {
        /// Target container path.
        path: PathBuf,
        /// Frames in the segment.
        frames: usize,
    },
    /// An encode worker finished writing a segment file.
    SegmentWritten {
        /// Container path that was written.
        path: PathBuf,
        /// Frames written.
        frames: usize,
    },
    /// A segment failed to encode; capture continues.
    SegmentFailed {
        /// Target container path.
        path: PathBuf,
        /// Failure description.
        reason: String,
    },
    /// The source stopped producing frames; the run is ending.
    SourceLost {
        /// Failure description.
        reason: String,
    },
    /// A recording run finished and released its resources.
    RecordingStopped {
        /// Total frames captured.
        total_frames: u64,
        /// Segments handed off for encoding.
        segments: u64,
    },
    /// A sampling batch started scanning its input folder.
    BatchStarted {
        /// Folder being scanned.
        input: PathBuf,
        /// Folder receiving per-video still directories.
        output: PathBuf,
    },
    /// A directory entry without the video extension was skipped.
    VideoSkipped {
        /// The skipped entry.
        path: PathBuf,
    },
    /// One video could not be processed; the batch continues.
    VideoFailed {
        /// The failing video.
        path: PathBuf,
        /// Failure description.
        reason: String,
    },
    /// The reported rate fell in the gap of the stride policy, so no
    /// frames will be selected from this video.
    SamplingRateGap {
        /// The affected video.
        path: PathBuf,
        /// The reported frame rate.
        frame_rate: f64,
    },
    /// One still image failed to write; the video continues.
    StillFailed {
        /// Target image path.
        path: PathBuf,
        /// Failure description.
        reason: String,
    },
    /// One video was walked to the end.
    VideoSampled {
        /// The processed video.
        path: PathBuf,
        /// Frames read from the video.
        frames_read: u64,
        /// Stills written for the video.
        stills_written: u64,
    },
    /// A sampling batch finished.
    BatchFinished {
        /// Videos fully processed.
        processed: u64,
        /// Entries skipped for a non-matching extension.
        skipped: u64,
        /// Videos that failed in isolation.
        failed: u64,
    },
}

/// Receiver for pipeline events.
///
/// Implementations must be cheap and non-blocking; pipelines emit from
/// their hot loops.
pub trait EventSink: Send + Sync {
    /// Delivers one event to the sink.
    fn emit(&self, event: Event);
}

/// Event sink that forwards every event to `tracing`.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    /// Creates a new tracing-backed sink.
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogSink {
    fn emit(&self, event: Event) {
        match event {
            Event::RecordingStarted {
                address,
                frame_rate,
                width,
                height,
            } => {
                tracing::info!(%address, frame_rate, width, height, "recording started");
            }
            Event::Heartbeat {
                buffered_frames,
                total_frames,
            } => {
                tracing::info!(buffered_frames, total_frames, "recording");
            }
            Event::SegmentQueued { path, frames } => {
                tracing::info!(path = %path.display(), frames, "segment queued for encoding");
            }
            Event::SegmentWritten { path, frames } => {
                tracing::info!(path = %path.display(), frames, "segment written");
            }
            Event::SegmentFailed { path, reason } => {
                tracing::error!(path = %path.display(), %reason, "segment encode failed");
            }
            Event::SourceLost { reason } => {
                tracing::error!(%reason, "source stopped producing frames");
            }
            Event::RecordingStopped {
                total_frames,
                segments,
            } => {
                tracing::info!(total_frames, segments, "recording stopped");
            }
            Event::BatchStarted { input, output } => {
                tracing::info!(
                    input = %input.display(),
                    output = %output.display(),
                    "sampling batch started"
                );
            }
            Event::VideoSkipped { path } => {
                tracing::debug!(path = %path.display(), "skipped non-video entry");
            }
            Event::VideoFailed { path, reason } => {
                tracing::error!(path = %path.display(), %reason, "video failed");
            }
            Event::SamplingRateGap { path, frame_rate } => {
                tracing::warn!(
                    path = %path.display(),
                    frame_rate,
                    "frame rate has no stride; no frames will be selected"
                );
            }
            Event::StillFailed { path, reason } => {
                tracing::warn!(path = %path.display(), %reason, "still write failed");
            }
            Event::VideoSampled {
                path,
                frames_read,
                stills_written,
            } => {
                tracing::info!(
                    path = %path.display(),
                    frames_read,
                    stills_written,
                    "finished processing video"
                );
            }
            Event::BatchFinished {
                processed,
                skipped,
                failed,
            } => {
                tracing::info!(processed, skipped, failed, "sampling batch finished");
            }
        }
    }
}

/// Event sink that records events in memory for inspection in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every event emitted so far.
    pub fn events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(_) => Vec::new(),
        }
    }

    /// Returns how many recorded events satisfy `predicate`.
    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();

        sink.emit(Event::Heartbeat {
            buffered_frames: 3,
            total_frames: 3,
        });
        sink.emit(Event::SourceLost {
            reason: "stream ended".into(),
        });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::Heartbeat { .. }));
        assert!(matches!(events[1], Event::SourceLost { .. }));
    }

    #[test]
    fn test_memory_sink_count() {
        let sink = MemorySink::new();
        for _ in 0..3 {
            sink.emit(Event::VideoSkipped {
                path: PathBuf::from("notes.txt"),
            });
        }

        assert_eq!(sink.count(|e| matches!(e, Event::VideoSkipped { .. })), 3);
        assert_eq!(sink.count(|e| matches!(e, Event::VideoFailed { .. })), 0);
    }
}
