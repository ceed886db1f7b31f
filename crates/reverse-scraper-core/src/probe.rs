//! Image probing: reads pixel dimensions from local files or fetched bytes.
//!
//! Only the image header is decoded. The decompression-bomb guard rejects
//! anything whose pixel count exceeds the configured limit before any pixel
//! buffer would be allocated.

use image::io::Reader as ImageReader;
use std::fmt;
use std::io::{BufRead, Cursor, Seek};
use std::path::Path;
use thiserror::Error;

/// Default pixel limit, matching the classic decompression-bomb threshold
pub const DEFAULT_MAX_PIXELS: u64 = 178_956_970;

/// Errors raised while measuring an image
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The source could not be read
    #[error("unreadable image source: {0}")]
    Unreadable(#[from] std::io::Error),

    /// The bytes do not look like any supported image format
    #[error("unrecognized image format")]
    Unrecognized,

    /// The header was recognized but could not be decoded
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),

    /// The image is larger than the pixel limit allows
    #[error("image of {width}x{height} exceeds the {limit} pixel limit")]
    DecompressionBomb { width: u32, height: u32, limit: u64 },
}

/// Pixel dimensions of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when strictly larger than `other` in width or in height
    pub fn exceeds(&self, other: &Dimensions) -> bool {
        self.width > other.width || self.height > other.height
    }

    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Measure an image file on disk. The file handle is released on return.
pub fn measure_file(path: &Path, max_pixels: u64) -> Result<Dimensions, ProbeError> {
    let reader = ImageReader::open(path)?;
    measure_reader(reader, max_pixels)
}

/// Measure an image held in memory
pub fn measure_bytes(bytes: &[u8], max_pixels: u64) -> Result<Dimensions, ProbeError> {
    measure_reader(ImageReader::new(Cursor::new(bytes)), max_pixels)
}

fn measure_reader<R: BufRead + Seek>(
    reader: ImageReader<R>,
    max_pixels: u64,
) -> Result<Dimensions, ProbeError> {
    let reader = reader.with_guessed_format()?;
    if reader.format().is_none() {
        return Err(ProbeError::Unrecognized);
    }

    let (width, height) = reader.into_dimensions()?;
    let dimensions = Dimensions::new(width, height);
    if dimensions.pixels() > max_pixels {
        return Err(ProbeError::DecompressionBomb {
            width,
            height,
            limit: max_pixels,
        });
    }

    Ok(dimensions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::png_bytes;
    use tempfile::tempdir;

    #[test]
    fn test_measure_bytes_png() {
        let bytes = png_bytes(42, 83);
        let dims = measure_bytes(&bytes, DEFAULT_MAX_PIXELS).unwrap();
        assert_eq!(dims, Dimensions::new(42, 83));
    }

    #[test]
    fn test_measure_file_releases_and_reports() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.png");
        std::fs::write(&path, png_bytes(20, 10)).unwrap();

        let dims = measure_file(&path, DEFAULT_MAX_PIXELS).unwrap();
        assert_eq!(dims, Dimensions::new(20, 10));

        // The handle is gone, so the file can be removed right away
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_garbage_is_unrecognized() {
        let result = measure_bytes(b"<html>not an image</html>", DEFAULT_MAX_PIXELS);
        assert!(matches!(result, Err(ProbeError::Unrecognized)));
    }

    #[test]
    fn test_pixel_limit_trips() {
        let bytes = png_bytes(100, 100);
        let result = measure_bytes(&bytes, 9_999);
        assert!(matches!(
            result,
            Err(ProbeError::DecompressionBomb {
                width: 100,
                height: 100,
                limit: 9_999
            })
        ));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let result = measure_file(Path::new("/path/that/does/not/exist.png"), DEFAULT_MAX_PIXELS);
        assert!(matches!(result, Err(ProbeError::Unreadable(_))));
    }

    #[test]
    fn test_exceeds_is_strict_on_either_axis() {
        let source = Dimensions::new(100, 100);
        assert!(Dimensions::new(300, 200).exceeds(&source));
        assert!(Dimensions::new(50, 101).exceeds(&source));
        assert!(!Dimensions::new(100, 100).exceeds(&source));
        assert!(!Dimensions::new(99, 100).exceeds(&source));
    }
}
