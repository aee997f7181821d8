// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cartoteca Document — file-level processing for the letters pipeline.
// Extracts embedded images from scanned volume PDFs, curates the resulting
// JPEG corpus, and recognizes the text on each letter.

pub mod curate;
pub mod image;
pub mod pdf;
pub mod scan;

pub use curate::{ExclusionList, ImageCurator};
pub use image::ScanImage;
pub use pdf::VolumeExtractor;
pub use scan::{OcrConfig, OcrEngine};
