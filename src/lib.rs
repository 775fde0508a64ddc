//! Clipboard keeper library
//!
//! Polls the system clipboard on a fixed interval and saves every new piece
//! of text, image or copied file into a directory, skipping repeats.

#![deny(unsafe_op_in_unsafe_fn)]

pub mod backends;
pub mod config;
pub mod core;
pub mod error;

pub use crate::backends::{Backend, ClipboardSource};
pub use crate::config::CaptureConfig;
pub use crate::core::{CaptureEvent, CaptureListener, CaptureLoop};
pub use crate::error::{CaptureError, ClipboardError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::backends::{Backend, ClipboardSource, HelperProgram};
    pub use crate::config::{BackendChoice, CaptureConfig};
    pub use crate::core::{
        CaptureEvent, CaptureListener, CaptureLoop, CapturedPayload, ContentKind, OutputRecord,
    };
    pub use crate::error::{CaptureError, ClipboardError};
}
