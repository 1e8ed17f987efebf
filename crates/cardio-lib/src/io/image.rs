use crate::error::Result;
use image::RgbImage;

/// Decode PNG/JPEG/WebP bytes into an 8-bit RGB grid.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}
