//! Image preparation: validate, downscale, and re-encode for transmission.
//!
//! Vision APIs accept images as base64 payloads embedded in the JSON
//! request body, so oversized uploads fail late and expensively. This stage
//! enforces the limits up front — file size before decode, pixel dimensions
//! after — so an unusable image is rejected before any network call.
//!
//! Every accepted image leaves this stage as RGB JPEG regardless of source
//! format: one transmission format keeps the request-building code format
//! agnostic, and JPEG keeps scanned-document payloads small enough to fit
//! provider body limits after base64 inflation.

use crate::error::ExtractError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::imageops::FilterType;
use image::DynamicImage;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// A validated, resized, JPEG-encoded image ready for dispatch.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl PreparedImage {
    pub(crate) fn from_jpeg_bytes(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            bytes,
            width,
            height,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Encoded bytes as bare base64 (native-client transport).
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Encoded bytes as a `data:` URI (hosted-chat transport).
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.to_base64())
    }
}

/// Validate and prepare a source image for dispatch.
///
/// Enforced in order:
/// 1. the file exists — [`ExtractError::ImageNotFound`];
/// 2. the file is at most `max_bytes` — [`ExtractError::ImageTooLarge`],
///    checked before decoding so a 200 MB upload never allocates pixels;
/// 3. the file decodes as a raster image — [`ExtractError::InvalidImage`];
/// 4. neither dimension exceeds `max_dimension` after an aspect-preserving
///    downscale (images already within bounds are not resampled);
/// 5. the pixels are converted to RGB and re-encoded as JPEG.
pub fn prepare_image(
    path: &Path,
    max_bytes: u64,
    max_dimension: u32,
) -> Result<PreparedImage, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::ImageNotFound {
            path: path.to_path_buf(),
        });
    }

    let size = std::fs::metadata(path)
        .map_err(|_| ExtractError::ImageNotFound {
            path: path.to_path_buf(),
        })?
        .len();
    if size > max_bytes {
        return Err(ExtractError::ImageTooLarge {
            path: path.to_path_buf(),
            size,
            limit: max_bytes,
        });
    }

    let decoded = image::ImageReader::open(path)
        .map_err(|e| ExtractError::InvalidImage {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?
        .with_guessed_format()
        .map_err(|e| ExtractError::InvalidImage {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?
        .decode()
        .map_err(|e| ExtractError::InvalidImage {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let (orig_w, orig_h) = (decoded.width(), decoded.height());
    let resized = if orig_w.max(orig_h) > max_dimension {
        decoded.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        decoded
    };

    // JPEG has no alpha channel; convert unconditionally so GIF/PNG sources
    // with transparency encode cleanly.
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
    let (width, height) = (rgb.width(), rgb.height());

    let mut bytes = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
        .map_err(|e| ExtractError::InvalidImage {
            path: path.to_path_buf(),
            detail: format!("JPEG re-encoding failed: {e}"),
        })?;

    debug!(
        "Prepared image {}: {}x{} → {}x{}, {} bytes",
        path.display(),
        orig_w,
        orig_h,
        width,
        height,
        bytes.len()
    );

    Ok(PreparedImage {
        bytes,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Write;

    fn save_png(width: u32, height: u32) -> tempfile::TempPath {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255]));
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        img.save(file.path()).unwrap();
        file.into_temp_path()
    }

    #[test]
    fn missing_file_is_image_not_found() {
        let err = prepare_image(Path::new("/definitely/not/here.png"), 1 << 20, 2048).unwrap_err();
        assert!(matches!(err, ExtractError::ImageNotFound { .. }));
    }

    #[test]
    fn oversized_file_fails_before_decode() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(&[0u8; 256]).unwrap();
        // 256-byte file against a 100-byte budget: the garbage content must
        // never be decoded, so the error is size, not validity.
        let err = prepare_image(file.path(), 100, 2048).unwrap_err();
        match err {
            ExtractError::ImageTooLarge { size, limit, .. } => {
                assert_eq!(size, 256);
                assert_eq!(limit, 100);
            }
            other => panic!("expected ImageTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn garbage_bytes_are_invalid_image() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"this is not an image at all").unwrap();
        let err = prepare_image(file.path(), 1 << 20, 2048).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidImage { .. }));
    }

    #[test]
    fn small_image_is_not_resampled() {
        let path = save_png(64, 48);
        let prepared = prepare_image(&path, 1 << 20, 2048).unwrap();
        assert_eq!((prepared.width(), prepared.height()), (64, 48));
        assert!(!prepared.is_empty());
    }

    #[test]
    fn large_image_is_downscaled_preserving_aspect() {
        let path = save_png(300, 100);
        let prepared = prepare_image(&path, 1 << 20, 100).unwrap();
        assert!(prepared.width() <= 100 && prepared.height() <= 100);
        // 3:1 aspect survives the downscale.
        assert_eq!(prepared.width(), 100);
        assert_eq!(prepared.height(), 33);
    }

    #[test]
    fn output_is_jpeg_with_data_uri() {
        let path = save_png(10, 10);
        let prepared = prepare_image(&path, 1 << 20, 2048).unwrap();

        let decoded = STANDARD.decode(prepared.to_base64()).unwrap();
        // JPEG SOI marker.
        assert_eq!(&decoded[..2], &[0xFF, 0xD8]);
        assert!(prepared.to_data_uri().starts_with("data:image/jpeg;base64,"));
    }
}
