use crate::selftest::sample_png;

/// Encode a blank PNG of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    sample_png(width, height).unwrap()
}
