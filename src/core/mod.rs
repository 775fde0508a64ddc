// src/core/mod.rs
//! Change detection and dispatch core

pub mod capture_loop;
pub mod classifier;
pub mod equality;
pub mod events;
pub mod naming;
pub mod payload;
pub mod persist;
pub mod session;

pub use capture_loop::{shutdown_signal, CaptureLoop, LoopStats};
pub use classifier::{classify, Classification, RawClipboardRead, UnsupportedShape};
pub use equality::is_unchanged;
pub use events::{CaptureEvent, CaptureListener};
pub use naming::build_name;
pub use payload::{CapturedPayload, ContentKind, FileRefPayload, ImagePayload};
pub use persist::OutputRecord;
pub use session::{SessionState, Slot};
