// src/error.rs
//! Error types shared by the capture core and the clipboard backends

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// A failed attempt to read one kind of content from the clipboard.
///
/// All variants are transient from the capture loop's point of view: the
/// failure is logged, the kind's session slot is forgotten, and the next tick
/// tries again.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard backend error: {0}")]
    Backend(String),

    #[error("failed to run clipboard helper `{program}`: {source}")]
    HelperSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("clipboard helper `{program}` exited with {status}: {stderr}")]
    HelperFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("clipboard helper `{program}` did not finish within {timeout:?}")]
    HelperTimeout { program: String, timeout: Duration },

    #[error("could not decode clipboard image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("unexpected clipboard image layout ({width}x{height}, {len} bytes)")]
    ImageLayout {
        width: usize,
        height: usize,
        len: usize,
    },

    #[error("could not read copied file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<arboard::Error> for ClipboardError {
    fn from(err: arboard::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Errors raised by the capture core.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("target directory does not exist: {0}")]
    InvalidTargetDir(PathBuf),

    #[error("target is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("poll interval must be at least one second")]
    InvalidInterval,

    #[error("failed to write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode image as PNG: {0}")]
    Encode(#[from] image::ImageError),

    #[error("could not find a free file name for {stem} after {attempts} attempts")]
    NameExhausted { stem: String, attempts: usize },

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

pub type Result<T, E = CaptureError> = std::result::Result<T, E>;
