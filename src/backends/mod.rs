// src/backends/mod.rs
//! Platform clipboard access
//!
//! The capture loop only sees the [`ClipboardSource`] capability. Which
//! implementation backs it is decided once at startup:
//!
//! - [`NativeClipboard`]: OS clipboard bindings for text and images
//! - [`HelperClipboard`]: OS bindings for text, an external helper program
//!   (`xclip` or `wl-paste`) for images and copied files

pub mod helper;
pub mod native;
#[cfg(test)]
pub(crate) mod scripted;

use std::path::PathBuf;

use image::DynamicImage;
use tracing::info;

use crate::config::{BackendChoice, CaptureConfig};
use crate::error::ClipboardError;

pub use helper::{HelperClipboard, HelperProgram};
pub use native::NativeClipboard;

/// Read access to the system clipboard.
///
/// Each method returns `Ok(None)` when the clipboard holds nothing of that
/// kind and `Err` when the read itself failed.
#[allow(async_fn_in_trait)]
pub trait ClipboardSource {
    /// Short name for logs and status events
    fn name(&self) -> String;

    /// Whether image and file reads are available at all. Text is always
    /// attempted.
    fn supports_rich_content(&self) -> bool {
        true
    }

    async fn read_text(&mut self) -> Result<Option<String>, ClipboardError>;

    async fn read_image(&mut self) -> Result<Option<DynamicImage>, ClipboardError>;

    async fn read_file_list(&mut self) -> Result<Option<Vec<PathBuf>>, ClipboardError>;
}

/// The backend picked at startup
#[derive(Debug)]
pub enum Backend {
    Native(NativeClipboard),
    Helper(HelperClipboard),
}

impl Backend {
    /// Resolve the configured backend choice for this platform
    pub fn from_config(config: &CaptureConfig) -> Self {
        let use_helper = match config.backend {
            BackendChoice::Native => false,
            BackendChoice::Helper => true,
            BackendChoice::Auto => cfg!(target_os = "linux"),
        };

        let backend = if use_helper {
            let program = config.helper.unwrap_or_else(HelperProgram::detect);
            Backend::Helper(HelperClipboard::new(
                program,
                config.helper_timeout,
                config.image_types.clone(),
            ))
        } else {
            Backend::Native(NativeClipboard::new())
        };
        info!("📋 Clipboard backend: {}", backend.name());
        backend
    }
}

impl ClipboardSource for Backend {
    fn name(&self) -> String {
        match self {
            Backend::Native(inner) => inner.name(),
            Backend::Helper(inner) => inner.name(),
        }
    }

    fn supports_rich_content(&self) -> bool {
        match self {
            Backend::Native(inner) => inner.supports_rich_content(),
            Backend::Helper(inner) => inner.supports_rich_content(),
        }
    }

    async fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
        match self {
            Backend::Native(inner) => inner.read_text().await,
            Backend::Helper(inner) => inner.read_text().await,
        }
    }

    async fn read_image(&mut self) -> Result<Option<DynamicImage>, ClipboardError> {
        match self {
            Backend::Native(inner) => inner.read_image().await,
            Backend::Helper(inner) => inner.read_image().await,
        }
    }

    async fn read_file_list(&mut self) -> Result<Option<Vec<PathBuf>>, ClipboardError> {
        match self {
            Backend::Native(inner) => inner.read_file_list().await,
            Backend::Helper(inner) => inner.read_file_list().await,
        }
    }
}
