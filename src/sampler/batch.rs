//! Batch sampling over a folder of recorded videos.

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use super::still::StillSink;
use super::stride::stride_for_rate;
use crate::capture::{SourceError, SourceOpener};
use crate::event::{Event, EventSink};

/// Configuration for a sampling batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Extension of the video files to process.
    pub video_ext: String,
    /// Extension of the emitted still images.
    pub image_ext: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            video_ext: "mp4".into(),
            image_ext: "jpg".into(),
        }
    }
}

/// Errors that can occur during sampling.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("input path {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("failed to create directory {path}: {reason}")]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// Failure description.
        reason: String,
    },
    #[error("failed to scan {path}: {reason}")]
    Scan {
        /// The directory that could not be enumerated.
        path: PathBuf,
        /// Failure description.
        reason: String,
    },
}

/// Totals for one sampling batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Videos fully processed.
    pub processed: u64,
    /// Entries skipped for a non-matching extension.
    pub skipped: u64,
    /// Videos that failed in isolation.
    pub failed: u64,
}

/// Totals for one sampled video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoReport {
    /// Frames read from the video.
    pub frames_read: u64,
    /// Stills written for the video.
    pub stills_written: u64,
}

/// Sequential frame sampler over recorded videos.
pub struct Sampler<O: SourceOpener, W: StillSink> {
    opener: O,
    stills: W,
    config: SamplerConfig,
    events: Arc<dyn EventSink>,
}

impl<O: SourceOpener, W: StillSink> Sampler<O, W> {
    /// Creates a sampler over the given opener and still sink.
    pub fn new(opener: O, stills: W, config: SamplerConfig, events: Arc<dyn EventSink>) -> Self {
        Self {
            opener,
            stills,
            config,
            events,
        }
    }

    /// Samples every matching video in `input` into `output`.
    ///
    /// One output subfolder per video, named after its stem. Failures
    /// are isolated per video: a file that cannot be opened or read is
    /// reported and the batch moves on.
    pub fn sample_folder(&self, input: &Path, output: &Path) -> Result<BatchReport, SampleError> {
        if !input.is_dir() {
            return Err(SampleError::NotADirectory(input.to_path_buf()));
        }
        fs::create_dir_all(output).map_err(|e| SampleError::CreateDir {
            path: output.to_path_buf(),
            reason: e.to_string(),
        })?;

        self.events.emit(Event::BatchStarted {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
        });

        let mut report = BatchReport::default();
        let entries = fs::read_dir(input).map_err(|e| SampleError::Scan {
            path: input.to_path_buf(),
            reason: e.to_string(),
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| SampleError::Scan {
                path: input.to_path_buf(),
                reason: e.to_string(),
            })?;
            let path = entry.path();

            let matches = path.extension().and_then(OsStr::to_str)
                == Some(self.config.video_ext.as_str());
            if !matches {
                self.events.emit(Event::VideoSkipped { path });
                report.skipped += 1;
                continue;
            }

            let Some(stem) = path.file_stem().and_then(OsStr::to_str) else {
                self.events.emit(Event::VideoFailed {
                    path,
                    reason: "file name is not valid unicode".into(),
                });
                report.failed += 1;
                continue;
            };

            let video_out = output.join(stem);
            if let Err(e) = fs::create_dir_all(&video_out) {
                self.events.emit(Event::VideoFailed {
                    path,
                    reason: e.to_string(),
                });
                report.failed += 1;
                continue;
            }

            match self.sample_video(&path, &video_out) {
                Ok(_) => report.processed += 1,
                Err(e) => {
                    self.events.emit(Event::VideoFailed {
                        path,
                        reason: e.to_string(),
                    });
                    report.failed += 1;
                }
            }
        }

        self.events.emit(Event::BatchFinished {
            processed: report.processed,
            skipped: report.skipped,
            failed: report.failed,
        });
        Ok(report)
    }

    /// Walks one video and writes every stride-th frame as a still.
    ///
    /// The whole file is read even when the rate policy yields no
    /// stride, so the completion event always carries the true frame
    /// count. A failed still write is isolated to that frame.
    pub fn sample_video(&self, video: &Path, out_dir: &Path) -> Result<VideoReport, SampleError> {
        let mut source = self.opener.open(video)?;

        let frame_rate = source.frame_rate();
        let stride = stride_for_rate(frame_rate);
        if stride.is_none() {
            self.events.emit(Event::SamplingRateGap {
                path: video.to_path_buf(),
                frame_rate,
            });
        }

        let stem = video
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or("video");

        let mut index: u64 = 0;
        let mut stills_written: u64 = 0;
        loop {
            let frame = match source.read_frame()? {
                Some(frame) => frame,
                None => break,
            };

            if let Some(stride) = stride {
                if index % u64::from(stride) == 0 {
                    let still = out_dir.join(format!(
                        "{stem}_frame_{index:04}.{}",
                        self.config.image_ext
                    ));
                    match self.stills.write_still(&still, &frame) {
                        Ok(()) => stills_written += 1,
                        Err(e) => self.events.emit(Event::StillFailed {
                            path: still,
                            reason: e.to_string(),
                        }),
                    }
                }
            }
            index += 1;
        }
        source.close();

        self.events.emit(Event::VideoSampled {
            path: video.to_path_buf(),
            frames_read: index,
            stills_written,
        });
        Ok(VideoReport {
            frames_read: index,
            stills_written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::MockOpener;
    use crate::event::MemorySink;
    use crate::sampler::still::MemoryStillSink;
    use std::fs::File;

    fn sampler(
        opener: MockOpener,
        stills: MemoryStillSink,
        events: Arc<MemorySink>,
    ) -> Sampler<MockOpener, MemoryStillSink> {
        Sampler::new(opener, stills, SamplerConfig::default(), events)
    }

    fn still_indices(paths: &[PathBuf]) -> Vec<u64> {
        let mut indices: Vec<u64> = paths
            .iter()
            .map(|p| {
                let name = p.file_stem().unwrap().to_str().unwrap();
                name.rsplit('_').next().unwrap().parse().unwrap()
            })
            .collect();
        indices.sort_unstable();
        indices
    }

    #[test]
    fn test_low_rate_stride_indices() {
        let events = Arc::new(MemorySink::new());
        let sampler = sampler(
            MockOpener::new(10.0, 47),
            MemoryStillSink::new(),
            events.clone(),
        );

        let report = sampler
            .sample_video(Path::new("clip.mp4"), Path::new("out/clip"))
            .unwrap();

        assert_eq!(report.frames_read, 47);
        assert_eq!(report.stills_written, 10);
        let written = sampler.stills.written();
        assert_eq!(
            still_indices(&written),
            vec![0, 5, 10, 15, 20, 25, 30, 35, 40, 45]
        );
        assert!(written
            .iter()
            .all(|p| p.file_name().unwrap().to_str().unwrap().starts_with("clip_frame_")));
    }

    #[test]
    fn test_high_rate_stride_indices() {
        let events = Arc::new(MemorySink::new());
        let sampler = sampler(
            MockOpener::new(30.0, 25),
            MemoryStillSink::new(),
            events.clone(),
        );

        let report = sampler
            .sample_video(Path::new("clip.mp4"), Path::new("out/clip"))
            .unwrap();

        assert_eq!(report.stills_written, 3);
        assert_eq!(still_indices(&sampler.stills.written()), vec![0, 10, 20]);
    }

    // Rates strictly between the bands select nothing; the whole file
    // is still walked and the gap is surfaced as an event.
    #[test]
    fn test_rate_gap_selects_nothing() {
        let events = Arc::new(MemorySink::new());
        let sampler = sampler(
            MockOpener::new(20.0, 40),
            MemoryStillSink::new(),
            events.clone(),
        );

        let report = sampler
            .sample_video(Path::new("clip.mp4"), Path::new("out/clip"))
            .unwrap();

        assert_eq!(report.frames_read, 40);
        assert_eq!(report.stills_written, 0);
        assert!(sampler.stills.written().is_empty());
        assert_eq!(
            events.count(|e| matches!(e, Event::SamplingRateGap { .. })),
            1
        );
    }

    #[test]
    fn test_still_failure_is_isolated_per_frame() {
        let events = Arc::new(MemorySink::new());
        let sampler = sampler(
            MockOpener::new(10.0, 12),
            MemoryStillSink::failing(),
            events.clone(),
        );

        let report = sampler
            .sample_video(Path::new("clip.mp4"), Path::new("out/clip"))
            .unwrap();

        // Indices 0, 5, 10 each fail; the walk still finishes.
        assert_eq!(report.frames_read, 12);
        assert_eq!(report.stills_written, 0);
        assert_eq!(events.count(|e| matches!(e, Event::StillFailed { .. })), 3);
        assert_eq!(events.count(|e| matches!(e, Event::VideoSampled { .. })), 1);
    }

    #[test]
    fn test_batch_isolates_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("segments");
        fs::create_dir(&input).unwrap();
        File::create(input.join("good.mp4")).unwrap();
        File::create(input.join("bad.mp4")).unwrap();

        let events = Arc::new(MemorySink::new());
        let opener = MockOpener::new(10.0, 12).with_failing(input.join("bad.mp4"));
        let sampler = sampler(opener, MemoryStillSink::new(), events.clone());

        let output = dir.path().join("stills");
        let report = sampler.sample_folder(&input, &output).unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(events.count(|e| matches!(e, Event::VideoFailed { .. })), 1);

        // The valid file was still fully processed.
        let written = sampler.stills.written();
        assert_eq!(still_indices(&written), vec![0, 5, 10]);
        assert!(written.iter().all(|p| p.starts_with(output.join("good"))));
        assert!(output.join("good").is_dir());
    }

    #[test]
    fn test_batch_skips_non_matching_extension() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("segments");
        fs::create_dir(&input).unwrap();
        File::create(input.join("clip.mp4")).unwrap();
        File::create(input.join("notes.txt")).unwrap();

        let events = Arc::new(MemorySink::new());
        let sampler = sampler(
            MockOpener::new(10.0, 5),
            MemoryStillSink::new(),
            events.clone(),
        );

        let report = sampler
            .sample_folder(&input, &dir.path().join("stills"))
            .unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(events.count(|e| matches!(e, Event::VideoSkipped { .. })), 1);
    }

    #[test]
    fn test_non_directory_input_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let events = Arc::new(MemorySink::new());
        let sampler = sampler(
            MockOpener::new(10.0, 5),
            MemoryStillSink::new(),
            events,
        );

        let result = sampler.sample_folder(&dir.path().join("missing"), &dir.path().join("out"));
        assert!(matches!(result, Err(SampleError::NotADirectory(_))));
    }
}
