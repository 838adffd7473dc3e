//! Deterministic segment file naming.
//!
//! A segment file is named by the wall-clock window it covers, both
//! endpoints at second resolution. Within one run starts increase
//! monotonically, so names never collide.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Timestamp format used in segment file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Derives the container path for a segment covering `[start, end]`.
pub fn segment_path(
    dir: &Path,
    start: DateTime<Local>,
    end: DateTime<Local>,
    ext: &str,
) -> PathBuf {
    dir.join(format!(
        "{}_to_{}.{}",
        start.format(TIMESTAMP_FORMAT),
        end.format(TIMESTAMP_FORMAT),
        ext
    ))
}
