// src/core/classifier.rs
//! Turns a raw clipboard read into a typed payload

use std::fmt;
use std::fs;
use std::path::PathBuf;

use image::{DynamicImage, GenericImageView};

use crate::core::payload::{CapturedPayload, FileRefPayload, ImagePayload};
use crate::error::ClipboardError;

/// What a backend handed back for one read, before any interpretation
#[derive(Debug, Clone)]
pub enum RawClipboardRead {
    Text(String),
    Image(DynamicImage),
    FileList(Vec<PathBuf>),
    Empty,
}

/// Shapes the clipboard can be in that are deliberately not captured
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedShape {
    MultipleFiles(usize),
    Directory(PathBuf),
    /// Pipes, sockets, devices and anything else without plain contents
    NotARegularFile(PathBuf),
}

impl fmt::Display for UnsupportedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsupportedShape::MultipleFiles(count) => {
                write!(f, "multiple files ({count}) on the clipboard")
            }
            UnsupportedShape::Directory(path) => {
                write!(f, "copied path is a directory: {}", path.display())
            }
            UnsupportedShape::NotARegularFile(path) => {
                write!(f, "copied path is not a regular file: {}", path.display())
            }
        }
    }
}

/// Outcome of classifying one raw read
#[derive(Debug, Clone)]
pub enum Classification {
    Payload(CapturedPayload),
    Unsupported(UnsupportedShape),
    Nothing,
}

/// Classify a raw read.
///
/// Whitespace-only text and zero-sized images count as no content. A file
/// list with exactly one regular file becomes a [`CapturedPayload::FileRef`]
/// whose contents are hashed here, so a missing or unreadable file surfaces
/// as a [`ClipboardError`] for that tick. Only regular files are opened.
pub fn classify(raw: RawClipboardRead) -> Result<Classification, ClipboardError> {
    let classification = match raw {
        RawClipboardRead::Text(text) => {
            if text.trim().is_empty() {
                Classification::Nothing
            } else {
                Classification::Payload(CapturedPayload::Text(text))
            }
        }
        RawClipboardRead::Image(image) => {
            let (width, height) = image.dimensions();
            if width == 0 || height == 0 {
                Classification::Nothing
            } else {
                Classification::Payload(CapturedPayload::Image(ImagePayload::new(image)))
            }
        }
        RawClipboardRead::FileList(mut paths) => match paths.len() {
            0 => Classification::Nothing,
            1 => {
                let path = paths.remove(0);
                let file_error = |source| ClipboardError::File {
                    path: path.clone(),
                    source,
                };
                let metadata = fs::metadata(&path).map_err(file_error)?;
                if metadata.is_dir() {
                    return Ok(Classification::Unsupported(UnsupportedShape::Directory(path)));
                }
                if !metadata.is_file() {
                    return Ok(Classification::Unsupported(UnsupportedShape::NotARegularFile(
                        path,
                    )));
                }
                let file = FileRefPayload::read(path.clone()).map_err(file_error)?;
                Classification::Payload(CapturedPayload::FileRef(file))
            }
            count => Classification::Unsupported(UnsupportedShape::MultipleFiles(count)),
        },
        RawClipboardRead::Empty => Classification::Nothing,
    };
    Ok(classification)
}
