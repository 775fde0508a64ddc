// src/core/persist.rs
//! Writing captured payloads into the target directory

use std::fs::File;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use image::ImageFormat;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::core::naming::build_name;
use crate::core::payload::{CapturedPayload, ContentKind};
use crate::error::{CaptureError, Result};

/// Attempts when another writer grabs the computed name between the
/// existence check and the rename
const MAX_RENAME_ATTEMPTS: usize = 3;

/// A file written for one detected change. Never modified afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct OutputRecord {
    pub kind: ContentKind,
    pub path: PathBuf,
    pub bytes: u64,
    pub saved_at: DateTime<Local>,
    /// Source path for copied files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

/// Extension used for a payload's output file, without the dot
pub fn extension_for(payload: &CapturedPayload) -> String {
    match payload {
        CapturedPayload::Text(_) => "txt".to_string(),
        CapturedPayload::Image(_) => "png".to_string(),
        CapturedPayload::FileRef(file) => file.extension(),
    }
}

/// What goes into an output file
#[derive(Debug)]
pub enum Encoded<'a> {
    /// Bytes produced in memory
    Bytes(Vec<u8>),
    /// A copied file, streamed from its source path at write time
    Source(&'a Path),
}

/// Serialized form of a payload as it is written to disk.
///
/// Text is UTF-8, images are always re-encoded to PNG and files are copied
/// byte for byte from their source.
pub fn encode(payload: &CapturedPayload) -> Result<Encoded<'_>> {
    match payload {
        CapturedPayload::Text(text) => Ok(Encoded::Bytes(text.as_bytes().to_vec())),
        CapturedPayload::Image(image) => {
            let mut png = Vec::new();
            image
                .source()
                .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
            Ok(Encoded::Bytes(png))
        }
        CapturedPayload::FileRef(file) => Ok(Encoded::Source(file.path())),
    }
}

/// Persist `payload` under a fresh name in `target_dir`.
///
/// The data goes to a temporary file in the same directory first and is then
/// renamed into place without clobbering, so a reader never sees a partial
/// file under the final name and an existing file is never overwritten.
pub fn persist(target_dir: &Path, prefix: &str, payload: &CapturedPayload) -> Result<OutputRecord> {
    let data = encode(payload)?;
    let extension = extension_for(payload);

    let mut attempt = 0;
    loop {
        attempt += 1;
        let path = build_name(target_dir, prefix, &extension)?;
        match write_new(target_dir, &path, &data) {
            Ok(bytes) => {
                let source = match payload {
                    CapturedPayload::FileRef(file) => Some(file.path().to_path_buf()),
                    _ => None,
                };
                return Ok(OutputRecord {
                    kind: payload.kind(),
                    path,
                    bytes,
                    saved_at: Local::now(),
                    source,
                });
            }
            Err(err)
                if err.kind() == io::ErrorKind::AlreadyExists && attempt < MAX_RENAME_ATTEMPTS =>
            {
                tracing::debug!("{} appeared while writing, picking another name", path.display());
            }
            Err(source) => return Err(CaptureError::Persist { path, source }),
        }
    }
}

/// Write `data` to a temp file and rename it to `path`. Returns the number
/// of bytes written.
fn write_new(target_dir: &Path, path: &Path, data: &Encoded<'_>) -> io::Result<u64> {
    let mut file = NamedTempFile::new_in(target_dir)?;
    let written = match data {
        Encoded::Bytes(bytes) => {
            file.write_all(bytes)?;
            bytes.len() as u64
        }
        Encoded::Source(source) => io::copy(&mut File::open(source)?, &mut file)?,
    };
    file.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }

    file.persist_noclobber(path).map_err(|err| err.error)?;
    Ok(written)
}
