//! Header-only dimension probing for local images.

use std::path::Path;

use image::ImageReader;
use tracing::{trace, warn};

use crate::models::MediaKind;

/// Reads image dimensions from the file header without decoding pixels.
///
/// Returns `None` for videos, unreadable files and zero-sized images; the
/// layout then falls back to a square tile.
pub fn probe_dimensions(path: &Path, kind: MediaKind) -> Option<(u32, u32)> {
    if kind != MediaKind::Image {
        return None;
    }

    trace!("Probing image dimensions for {:?}", path);
    let reader = match ImageReader::open(path).and_then(|r| r.with_guessed_format()) {
        Ok(reader) => reader,
        Err(e) => {
            warn!("Failed to open image {:?}: {}", path, e);
            return None;
        }
    };

    match reader.into_dimensions() {
        Ok((width, height)) if width > 0 && height > 0 => Some((width, height)),
        Ok(_) => None,
        Err(e) => {
            trace!("No readable dimensions for {:?}: {}", path, e);
            None
        }
    }
}
