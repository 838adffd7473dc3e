//! Bounded encode worker pool.
//!
//! Completed segments are encoded off the capture thread by a fixed
//! set of workers fed from a bounded channel. The bound caps how many
//! segments can sit in memory waiting for an encoder; once the queue
//! is full, handoff blocks until a worker frees a slot. Workers never
//! report back to the capture loop; their only observable effects are
//! the output file and the events they emit.

use crossbeam_channel::{bounded, Sender};
use std::sync::Arc;
use std::thread;

use super::writer::{EncodeError, SegmentJob, SegmentSink};
use crate::event::{Event, EventSink};

/// Fixed pool of encode workers behind a bounded queue.
pub struct EncodePool {
    tx: Option<Sender<SegmentJob>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl EncodePool {
    /// Spawns `workers` encode threads sharing one queue of at most
    /// `max_in_flight` pending segments.
    pub fn new(
        workers: usize,
        max_in_flight: usize,
        sink: Arc<dyn SegmentSink>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let (tx, rx) = bounded::<SegmentJob>(max_in_flight.max(1));

        let workers = (0..workers.max(1))
            .map(|_| {
                let rx = rx.clone();
                let sink = Arc::clone(&sink);
                let events = Arc::clone(&events);
                thread::spawn(move || {
                    while let Ok(job) = rx.recv() {
                        let frames = job.frames.len();
                        match sink.write_segment(&job) {
                            Ok(()) => events.emit(Event::SegmentWritten {
                                path: job.path.clone(),
                                frames,
                            }),
                            Err(e) => events.emit(Event::SegmentFailed {
                                path: job.path.clone(),
                                reason: e.to_string(),
                            }),
                        }
                    }
                })
            })
            .collect();

        Self {
            tx: Some(tx),
            workers,
        }
    }

    /// Queues one segment for encoding.
    ///
    /// Blocks while the queue holds `max_in_flight` segments already.
    pub fn submit(&self, job: SegmentJob) -> Result<(), EncodeError> {
        match &self.tx {
            Some(tx) => tx.send(job).map_err(|_| EncodeError::QueueClosed),
            None => Err(EncodeError::QueueClosed),
        }
    }

    /// Encodes everything still queued, then joins every worker.
    pub fn drain(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.tx.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for EncodePool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Frame;
    use crate::event::MemorySink;
    use crate::segment::writer::MockSegmentSink;
    use chrono::Local;
    use std::path::PathBuf;

    fn job(name: &str, frames: usize) -> SegmentJob {
        SegmentJob {
            path: PathBuf::from(name),
            frames: (1..=frames)
                .map(|s| Frame::new(vec![0u8; 8 * 8 * 3], 8, 8, s as u64))
                .collect(),
            frame_rate: 25.0,
            width: 8,
            height: 8,
            started_at: Local::now(),
            ended_at: Local::now(),
        }
    }

    #[test]
    fn test_drain_writes_everything_queued() {
        let sink = Arc::new(MockSegmentSink::new());
        let events = Arc::new(MemorySink::new());
        let pool = EncodePool::new(2, 4, sink.clone(), events.clone());

        for i in 0..5 {
            pool.submit(job(&format!("seg-{i}.mp4"), 3)).unwrap();
        }
        pool.drain();

        assert_eq!(sink.written().len(), 5);
        assert_eq!(
            events.count(|e| matches!(e, Event::SegmentWritten { .. })),
            5
        );
    }

    #[test]
    fn test_encode_failure_becomes_event() {
        let sink = Arc::new(MockSegmentSink::failing());
        let events = Arc::new(MemorySink::new());
        let pool = EncodePool::new(1, 2, sink, events.clone());

        pool.submit(job("seg.mp4", 2)).unwrap();
        pool.drain();

        assert_eq!(
            events.count(|e| matches!(e, Event::SegmentFailed { .. })),
            1
        );
        assert_eq!(
            events.count(|e| matches!(e, Event::SegmentWritten { .. })),
            0
        );
    }
}
