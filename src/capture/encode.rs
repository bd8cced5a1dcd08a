//! PNG encoding for captured pixels.

use super::types::{EncodeError, PixelSnapshot};
use image::ImageFormat;
use std::io::Cursor;

/// Encode a snapshot as PNG bytes.
pub fn encode_png(snapshot: &PixelSnapshot) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::new();
    snapshot
        .pixels()
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    log::debug!(
        "Encoded {}x{} snapshot into {} PNG bytes",
        snapshot.width(),
        snapshot.height(),
        bytes.len()
    );
    Ok(bytes)
}
