// src/core/session.rs
//! Per-kind memory of the last persisted payload

use crate::core::payload::{CapturedPayload, ContentKind};

/// State of one kind's slot
#[derive(Debug, Clone, Default)]
pub enum Slot {
    /// Nothing persisted yet, or forgotten after a failed read or write.
    /// The next payload of this kind is always treated as new.
    #[default]
    Unknown,
    /// Last payload persisted for this kind
    Seen(CapturedPayload),
}

impl Slot {
    pub fn payload(&self) -> Option<&CapturedPayload> {
        match self {
            Slot::Unknown => None,
            Slot::Seen(payload) => Some(payload),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Slot::Unknown)
    }
}

/// Last-seen payload for each content kind.
///
/// Owned by the capture loop and only changed through [`SessionState::record`]
/// after a successful save and [`SessionState::forget`] after a failure.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    text: Slot,
    image: Slot,
    file: Slot,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, kind: ContentKind) -> &Slot {
        match kind {
            ContentKind::Text => &self.text,
            ContentKind::Image => &self.image,
            ContentKind::FileRef => &self.file,
        }
    }

    fn slot_mut(&mut self, kind: ContentKind) -> &mut Slot {
        match kind {
            ContentKind::Text => &mut self.text,
            ContentKind::Image => &mut self.image,
            ContentKind::FileRef => &mut self.file,
        }
    }

    pub fn last(&self, kind: ContentKind) -> Option<&CapturedPayload> {
        self.slot(kind).payload()
    }

    /// Remember `payload` as the last persisted value of its kind
    pub fn record(&mut self, payload: CapturedPayload) {
        let kind = payload.kind();
        *self.slot_mut(kind) = Slot::Seen(payload);
    }

    /// Reset `kind` to unknown so its next read is captured unconditionally
    pub fn forget(&mut self, kind: ContentKind) {
        *self.slot_mut(kind) = Slot::Unknown;
    }
}
