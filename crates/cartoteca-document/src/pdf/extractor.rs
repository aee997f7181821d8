// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Volume extractor — walks one scanned volume PDF page by page and writes
// every embedded image that passes the minimum-dimension filter out as a
// normalized JPEG, emitting one manifest record per kept image.
//
// An image that cannot be decoded is skipped with a warning; a bad scan on
// page 200 must not cost the other 400 pages.

use std::io::Read;
use std::path::Path;

use cartoteca_core::config::PipelineConfig;
use cartoteca_core::error::{CartotecaError, Result};
use cartoteca_core::types::{format_image_id, portable_path, volume_dir_name, ImageRecord};
use flate2::read::ZlibDecoder;
use lopdf::xobject::PdfImage;
use lopdf::Document;
use tracing::{debug, info, instrument, warn};

use crate::image::ScanImage;

/// Extracts letter images from one volume PDF.
pub struct VolumeExtractor {
    doc: Document,
    volume: u32,
    min_width: u32,
    min_height: u32,
    jpeg_quality: u8,
}

impl VolumeExtractor {
    /// Open the PDF for `volume` and prepare it for extraction.
    ///
    /// A missing or unparseable file is fatal for this volume's run.
    #[instrument(skip_all, fields(path = %path.display(), volume))]
    pub fn open(path: &Path, volume: u32, config: &PipelineConfig) -> Result<Self> {
        let doc = Document::load(path).map_err(|err| {
            CartotecaError::PdfError(format!("failed to open {}: {}", path.display(), err))
        })?;
        info!(pages = doc.get_pages().len(), "volume PDF loaded");
        Ok(Self {
            doc,
            volume,
            min_width: config.min_width,
            min_height: config.min_height,
            jpeg_quality: config.jpeg_quality,
        })
    }

    /// Walk every page and write the kept images under
    /// `{base_dir}/{images_dir}/vol{N}/`, creating directories as needed.
    ///
    /// Returns the manifest records in page-then-ordinal order. Record
    /// paths are rendered relative to `base_dir` with forward slashes,
    /// ready for the manifest. Re-running on the same PDF overwrites the
    /// same filenames.
    #[instrument(skip_all, fields(volume = self.volume))]
    pub fn extract(&self, base_dir: &Path, images_dir: &Path) -> Result<Vec<ImageRecord>> {
        let rel_dir = images_dir.join(volume_dir_name(self.volume));
        let vol_dir = base_dir.join(&rel_dir);
        std::fs::create_dir_all(&vol_dir)?;

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (page, page_id) in self.doc.get_pages() {
            let page_images = match self.doc.get_page_images(page_id) {
                Ok(images) => images,
                Err(err) => {
                    debug!(page, error = %err, "no readable images on page");
                    continue;
                }
            };

            // The ordinal counts every encountered image object, kept or
            // not, so ids stay stable when thresholds change.
            for (index, pdf_image) in page_images.iter().enumerate() {
                let ordinal = index as u32 + 1;

                if pdf_image.width < i64::from(self.min_width)
                    || pdf_image.height < i64::from(self.min_height)
                {
                    debug!(
                        page,
                        ordinal,
                        width = pdf_image.width,
                        height = pdf_image.height,
                        "skipping undersized image"
                    );
                    skipped += 1;
                    continue;
                }

                let decoded = match decode_embedded_image(pdf_image) {
                    Ok(img) => img,
                    Err(err) => {
                        warn!(page, ordinal, error = %err, "skipping undecodable image");
                        skipped += 1;
                        continue;
                    }
                };

                let scan = ScanImage::from_dynamic(decoded);
                if scan.width() < self.min_width || scan.height() < self.min_height {
                    debug!(
                        page,
                        ordinal,
                        width = scan.width(),
                        height = scan.height(),
                        "skipping undersized image after decode"
                    );
                    skipped += 1;
                    continue;
                }

                let id = format_image_id(self.volume, page, ordinal);
                let file_name = format!("{id}.jpg");
                scan.write_jpeg(vol_dir.join(&file_name), self.jpeg_quality)?;

                let record = ImageRecord::new(
                    self.volume,
                    page,
                    ordinal,
                    portable_path(&rel_dir.join(&file_name)),
                )
                .with_dimensions(scan.width(), scan.height());
                records.push(record);

                if records.len() % 50 == 0 {
                    debug!(extracted = records.len(), "extraction progress");
                }
            }
        }

        info!(kept = records.len(), skipped, "volume extraction complete");
        Ok(records)
    }
}

/// Decode one embedded PDF image into pixels.
///
/// `DCTDecode` streams are JPEG and decode directly; `FlateDecode` streams
/// are zlib-compressed raw samples interpreted through the declared colour
/// space; anything else gets a container-sniffing decode attempt.
fn decode_embedded_image(pdf_image: &PdfImage) -> std::result::Result<image::DynamicImage, String> {
    let filters = pdf_image.filters.clone().unwrap_or_default();

    if filters.iter().any(|f| f == "DCTDecode") {
        image::load_from_memory(pdf_image.content).map_err(|err| format!("JPEG decode failed: {err}"))
    } else if filters.iter().any(|f| f == "FlateDecode") {
        decode_flate_image(pdf_image)
    } else {
        // JPXDecode and friends: the stream may still be a container the
        // image crate recognizes.
        image::load_from_memory(pdf_image.content)
            .map_err(|err| format!("unsupported filters {filters:?}: {err}"))
    }
}

/// Interpret a zlib-inflated sample buffer via the declared colour space.
fn decode_flate_image(pdf_image: &PdfImage) -> std::result::Result<image::DynamicImage, String> {
    let mut decoder = ZlibDecoder::new(pdf_image.content);
    let mut samples = Vec::new();
    decoder
        .read_to_end(&mut samples)
        .map_err(|err| format!("zlib inflate failed: {err}"))?;

    let width = pdf_image.width as u32;
    let height = pdf_image.height as u32;
    let color_space = pdf_image.color_space.as_deref().unwrap_or("DeviceRGB");

    let image = match color_space {
        "DeviceRGB" | "CalRGB" | "RGB" => {
            image::RgbImage::from_raw(width, height, samples).map(image::DynamicImage::ImageRgb8)
        }
        "DeviceGray" | "CalGray" | "Gray" => {
            image::GrayImage::from_raw(width, height, samples).map(image::DynamicImage::ImageLuma8)
        }
        "DeviceCMYK" | "CMYK" => image::RgbImage::from_raw(width, height, cmyk_to_rgb(&samples))
            .map(image::DynamicImage::ImageRgb8),
        other => {
            // Unknown space: dispatch on sample count.
            let pixels = width as usize * height as usize;
            if samples.len() == pixels * 3 {
                image::RgbImage::from_raw(width, height, samples)
                    .map(image::DynamicImage::ImageRgb8)
            } else if samples.len() == pixels {
                image::GrayImage::from_raw(width, height, samples)
                    .map(image::DynamicImage::ImageLuma8)
            } else {
                return Err(format!(
                    "colour space {other}: {} samples do not fit {width}x{height}",
                    samples.len()
                ));
            }
        }
    };

    image.ok_or_else(|| format!("sample buffer does not fill {width}x{height} {color_space}"))
}

/// Convert packed 8-bit CMYK samples to RGB.
fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity((cmyk.len() / 4) * 3);
    for chunk in cmyk.chunks_exact(4) {
        let c = f32::from(chunk[0]) / 255.0;
        let m = f32::from(chunk[1]) / 255.0;
        let y = f32::from(chunk[2]) / 255.0;
        let k = f32::from(chunk[3]) / 255.0;
        rgb.push((255.0 * (1.0 - c) * (1.0 - k)) as u8);
        rgb.push((255.0 * (1.0 - m) * (1.0 - k)) as u8);
        rgb.push((255.0 * (1.0 - y) * (1.0 - k)) as u8);
    }
    rgb
}
