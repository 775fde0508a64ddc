// src/core/equality.rs
//! Change detection between two payloads of the same kind
//!
//! - Text: exact string equality
//! - Image: pixel-wise comparison after conversion to RGB
//! - File: length and SHA-256 digest of the copied file's contents, never
//!   the path

use image::RgbImage;

use crate::core::payload::CapturedPayload;

/// Decide whether `current` repeats `previous`.
///
/// `previous` is the last payload persisted for the same kind; `None` means
/// the kind is unknown (never seen, or forgotten after a failure), which
/// always counts as a change. Payloads of different kinds are never equal.
pub fn is_unchanged(previous: Option<&CapturedPayload>, current: &CapturedPayload) -> bool {
    let Some(previous) = previous else {
        return false;
    };

    match (previous, current) {
        (CapturedPayload::Text(before), CapturedPayload::Text(after)) => before == after,
        (CapturedPayload::Image(before), CapturedPayload::Image(after)) => {
            same_image(Some(before.rgb()), Some(after.rgb()))
        }
        (CapturedPayload::FileRef(before), CapturedPayload::FileRef(after)) => {
            before.len() == after.len() && before.digest() == after.digest()
        }
        _ => false,
    }
}

/// Pixel-level image equality. Two absent images are equal; an absent image
/// never equals a present one. Differing dimensions are a difference.
pub fn same_image(a: Option<&RgbImage>, b: Option<&RgbImage>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            if a.dimensions() != b.dimensions() {
                return false;
            }
            a.pixels().zip(b.pixels()).all(|(p, q)| p == q)
        }
        _ => false,
    }
}
