// src/backends/native.rs
//! Clipboard access through the OS bindings in `arboard`

use std::fmt;
use std::path::PathBuf;

use arboard::Clipboard;
use image::{DynamicImage, RgbaImage};
use tracing::debug;

use super::ClipboardSource;
use crate::error::ClipboardError;

/// Text, image and copied-file reads through `arboard`.
///
/// The underlying handle is opened lazily and dropped after any backend
/// error, so a lost display connection is re-established on a later tick.
#[derive(Default)]
pub struct NativeClipboard {
    handle: Option<Clipboard>,
}

impl fmt::Debug for NativeClipboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeClipboard")
            .field("connected", &self.handle.is_some())
            .finish()
    }
}

impl NativeClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> Result<&mut Clipboard, ClipboardError> {
        if self.handle.is_none() {
            debug!("Opening native clipboard handle");
            self.handle = Some(Clipboard::new()?);
        }
        self.handle
            .as_mut()
            .ok_or_else(|| ClipboardError::Backend("clipboard handle unavailable".into()))
    }

    /// Blocking text read, shared with the helper backend
    pub(crate) fn get_text(&mut self) -> Result<Option<String>, ClipboardError> {
        let result = self.handle()?.get_text();
        self.settle(result)
    }

    fn get_image(&mut self) -> Result<Option<DynamicImage>, ClipboardError> {
        let result = self.handle()?.get_image();
        let Some(data) = self.settle(result)? else {
            return Ok(None);
        };

        let (width, height, len) = (data.width, data.height, data.bytes.len());
        let layout_error = || ClipboardError::ImageLayout { width, height, len };
        let w = u32::try_from(width).map_err(|_| layout_error())?;
        let h = u32::try_from(height).map_err(|_| layout_error())?;
        let rgba = RgbaImage::from_raw(w, h, data.bytes.into_owned()).ok_or_else(layout_error)?;
        Ok(Some(DynamicImage::ImageRgba8(rgba)))
    }

    fn get_file_list(&mut self) -> Result<Option<Vec<PathBuf>>, ClipboardError> {
        let result = self.handle()?.get().file_list();
        Ok(self.settle(result)?.and_then(non_empty))
    }

    /// Map "nothing of this kind" to `None` and drop the handle on real errors
    fn settle<T>(&mut self, result: Result<T, arboard::Error>) -> Result<Option<T>, ClipboardError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(err) => {
                self.handle = None;
                Err(err.into())
            }
        }
    }
}

impl ClipboardSource for NativeClipboard {
    fn name(&self) -> String {
        "native".to_string()
    }

    async fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
        self.get_text()
    }

    async fn read_image(&mut self) -> Result<Option<DynamicImage>, ClipboardError> {
        self.get_image()
    }

    async fn read_file_list(&mut self) -> Result<Option<Vec<PathBuf>>, ClipboardError> {
        self.get_file_list()
    }
}

/// An empty file list is no file content
fn non_empty(paths: Vec<PathBuf>) -> Option<Vec<PathBuf>> {
    (!paths.is_empty()).then_some(paths)
}
