// src/core/naming.rs
//! Collision-free output file names
//!
//! Names look like `clip_20121212_120102.png`. When that name is already
//! taken (two captures within the same second) a random UUID is appended:
//! `clip_20121212_120102_<uuid>.png`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::error::{CaptureError, Result};

/// How many fresh tokens to try before giving up
const MAX_TOKEN_ATTEMPTS: usize = 8;

/// `YYYYMMDD_HHMMSS` in local time
pub fn timestamp_stem(moment: &DateTime<Local>) -> String {
    moment.format("%Y%m%d_%H%M%S").to_string()
}

/// Build a path in `target_dir` that does not exist yet, stamped with the
/// current local time.
///
/// Only computes the name; writing is the caller's job. `extension` is given
/// without the leading dot and may be empty.
pub fn build_name(target_dir: &Path, prefix: &str, extension: &str) -> Result<PathBuf> {
    build_name_at(target_dir, prefix, extension, &Local::now())
}

pub fn build_name_at(
    target_dir: &Path,
    prefix: &str,
    extension: &str,
    moment: &DateTime<Local>,
) -> Result<PathBuf> {
    let stem = format!("{}_{}", prefix, timestamp_stem(moment));

    let candidate = target_dir.join(with_extension(&stem, extension));
    if !candidate.exists() {
        return Ok(candidate);
    }

    for _ in 0..MAX_TOKEN_ATTEMPTS {
        let token = Uuid::new_v4();
        let candidate = target_dir.join(with_extension(&format!("{stem}_{token}"), extension));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(CaptureError::NameExhausted {
        stem,
        attempts: MAX_TOKEN_ATTEMPTS,
    })
}

fn with_extension(stem: &str, extension: &str) -> String {
    if extension.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{extension}")
    }
}
