// src/core/payload.rs
//! Clipboard payload types

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Kind of clipboard content the capture loop tracks separately
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Text,
    Image,
    FileRef,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Text, ContentKind::Image, ContentKind::FileRef];
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentKind::Text => "text",
            ContentKind::Image => "image",
            ContentKind::FileRef => "file",
        };
        f.write_str(name)
    }
}

/// An image read from the clipboard.
///
/// The source keeps whatever color layout the backend produced (it is what
/// gets re-encoded to PNG); `rgb` is the 3-channel form used for comparison.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    source: DynamicImage,
    rgb: RgbImage,
}

impl ImagePayload {
    pub fn new(source: DynamicImage) -> Self {
        let rgb = source.to_rgb8();
        Self { source, rgb }
    }

    pub fn source(&self) -> &DynamicImage {
        &self.source
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgb.dimensions()
    }
}

/// SHA-256 of a copied file's contents
pub type ContentDigest = [u8; 32];

const READ_CHUNK: usize = 64 * 1024;

/// A single file copied to the clipboard, fingerprinted by its length and a
/// digest of its contents at the moment it was read.
///
/// The contents themselves are not kept; the saved copy is streamed from the
/// source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRefPayload {
    path: PathBuf,
    len: u64,
    digest: ContentDigest,
}

impl FileRefPayload {
    pub fn new(path: PathBuf, len: u64, digest: ContentDigest) -> Self {
        Self { path, len, digest }
    }

    /// Stream the file at `path` through the hasher without loading it whole
    pub fn read(path: PathBuf) -> io::Result<Self> {
        let mut file = File::open(&path)?;
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; READ_CHUNK];
        let mut len = 0u64;
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            len += n as u64;
        }
        Ok(Self::new(path, len, hasher.finalize().into()))
    }

    /// Fingerprint in-memory contents as if they had been read from `path`
    pub fn from_bytes(path: PathBuf, contents: &[u8]) -> Self {
        let digest = Sha256::digest(contents).into();
        Self::new(path, contents.len() as u64, digest)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn digest(&self) -> &ContentDigest {
        &self.digest
    }

    /// Extension of the source file, without the dot. Empty when the source
    /// has none.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One unit of clipboard content. Immutable once read.
#[derive(Debug, Clone)]
pub enum CapturedPayload {
    Text(String),
    Image(ImagePayload),
    FileRef(FileRefPayload),
}

impl CapturedPayload {
    pub fn kind(&self) -> ContentKind {
        match self {
            CapturedPayload::Text(_) => ContentKind::Text,
            CapturedPayload::Image(_) => ContentKind::Image,
            CapturedPayload::FileRef(_) => ContentKind::FileRef,
        }
    }

    /// Short human-readable description used in log lines
    pub fn summary(&self) -> String {
        match self {
            CapturedPayload::Text(text) => format!("{} chars of text", text.chars().count()),
            CapturedPayload::Image(image) => {
                let (width, height) = image.dimensions();
                format!("{width}x{height} image")
            }
            CapturedPayload::FileRef(file) => {
                format!("{} ({} bytes)", file.path().display(), file.len())
            }
        }
    }
}
