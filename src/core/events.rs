// src/core/events.rs
//! Status events emitted by the capture loop

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::core::payload::ContentKind;
use crate::core::persist::OutputRecord;

/// Something the capture loop did or observed
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CaptureEvent {
    Started {
        target_dir: PathBuf,
        #[serde(with = "secs")]
        interval: Duration,
        backend: String,
    },
    Saved {
        record: OutputRecord,
    },
    Unchanged {
        kind: ContentKind,
    },
    Unsupported {
        reason: String,
    },
    Failed {
        kind: ContentKind,
        error: String,
    },
    Stopped {
        ticks: u64,
        saved: u64,
    },
}

/// Receives capture events. Listeners run on the loop's thread, in the
/// order they were registered.
pub trait CaptureListener: Send {
    fn on_event(&mut self, event: &CaptureEvent);
}

impl<F> CaptureListener for F
where
    F: FnMut(&CaptureEvent) + Send,
{
    fn on_event(&mut self, event: &CaptureEvent) {
        self(event)
    }
}

mod secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}
