// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory wrapper around one decoded letter scan. Every image leaving the
// pipeline goes through `to_jpeg_bytes`, so the stored corpus is uniformly
// 3-channel JPEG whatever the source looked like.

use cartoteca_core::error::{CartotecaError, Result};
use image::DynamicImage;
use tracing::{debug, instrument};

/// A single decoded scan.
pub struct ScanImage {
    image: DynamicImage,
}

impl ScanImage {
    // -- Construction ---------------------------------------------------------

    /// Load a scan from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            CartotecaError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        debug!(width = img.width(), height = img.height(), "scan loaded");
        Ok(Self { image: img })
    }

    /// Decode a scan from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| CartotecaError::ImageError(format!("failed to decode image: {}", err)))?;
        debug!(width = img.width(), height = img.height(), "scan decoded from bytes");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the wrapper and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as JPEG bytes at the given quality (1-100).
    ///
    /// The image is converted to RGB8 first, which flattens alpha and
    /// palette-indexed sources into the 3-channel form the corpus stores.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| CartotecaError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Encode as JPEG and write to `path`.
    pub fn write_jpeg(&self, path: impl AsRef<std::path::Path>, quality: u8) -> Result<()> {
        let bytes = self.to_jpeg_bytes(quality)?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn png_with_alpha(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([200, 100, 50, 128]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
            .expect("encode test png");
        buffer
    }

    #[test]
    fn jpeg_output_flattens_alpha_to_three_channels() {
        let scan = ScanImage::from_bytes(&png_with_alpha(60, 40)).expect("decode png");
        let jpeg = scan.to_jpeg_bytes(90).expect("encode jpeg");

        let decoded = image::load_from_memory(&jpeg).expect("decode produced jpeg");
        assert_eq!(decoded.width(), 60);
        assert_eq!(decoded.height(), 40);
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn write_jpeg_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("scan.jpg");

        let scan = ScanImage::from_bytes(&png_with_alpha(32, 32)).expect("decode png");
        scan.write_jpeg(&path, 90).expect("write jpeg");

        let reopened = ScanImage::open(&path).expect("reopen jpeg");
        assert_eq!(reopened.width(), 32);
        assert_eq!(reopened.height(), 32);
    }

    #[test]
    fn from_bytes_rejects_garbage() {
        assert!(ScanImage::from_bytes(b"not an image at all").is_err());
    }
}
