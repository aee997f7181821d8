// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Curated exclusion list — images a human flagged as non-letter content.
// This is versioned input to the pipeline, not derived data.

use std::path::Path;

use cartoteca_core::error::Result;
use serde::{Deserialize, Serialize};

/// Relative paths (from the images root, forward slashes) of images to
/// drop from the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionList {
    entries: Vec<String>,
}

impl Default for ExclusionList {
    /// The entries flagged during review of the printed volumes:
    /// calibration checkerboards, ISBN barcodes, and publisher logos that
    /// the extractor cannot tell apart from letter scans.
    fn default() -> Self {
        Self {
            entries: vec![
                // vol1 back matter
                "vol1/vol1_p220_img6.jpg".into(),  // checkerboard plate
                "vol1/vol1_p220_img8.jpg".into(),  // ISBN barcode
                // vol2 back matter
                "vol2/vol2_p363_img1.jpg".into(),  // publisher logo
                "vol2/vol2_p363_img2.jpg".into(),  // publisher logo
                "vol2/vol2_p364_img6.jpg".into(),  // barcode
                "vol2/vol2_p364_img9.jpg".into(),  // checkerboard plate
                "vol2/vol2_p364_img12.jpg".into(), // checkerboard plate
            ],
        }
    }
}

impl ExclusionList {
    /// Load a list from a JSON file containing a plain array of paths.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn from_entries(entries: Vec<String>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
