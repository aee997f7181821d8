// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR for scanned letters, using the `ocrs` crate — a pure-Rust engine
// backed by neural network models executed via `rten`.
//
// The engine treats each image as one uniform block of printed text and
// returns the lines in reading order, joined with newlines. The
// recognition model fixes the script coverage, so a single engine instance
// is the "single fixed language" configuration of a whole batch run.
//
// # Model Setup
//
// Two model files are required:
//
// - detection model (`text-detection.rten`) — locates text regions
// - recognition model (`text-recognition.rten`) — decodes the characters
//
// They can be downloaded from the ocrs-models releases page, or obtained
// automatically by running the `ocrs-cli` tool once; the default cache
// location is `$XDG_CACHE_HOME/ocrs` (typically `~/.cache/ocrs`).
//
// Build OCR-heavy runs in release mode; rten inference is 10-100x slower
// in debug builds.

use std::path::{Path, PathBuf};

use cartoteca_core::error::{CartotecaError, Result};
use cartoteca_core::types::TextRecognizer;
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument, warn};

use crate::image::ScanImage;

/// Default directory for cached OCR model files.
///
/// Follows the XDG Base Directory specification: `$XDG_CACHE_HOME/ocrs`,
/// falling back to `~/.cache/ocrs` when `XDG_CACHE_HOME` is unset.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        // Last resort — current directory.
        PathBuf::from("ocrs-models")
    }
}

/// Well-known filenames for the detection and recognition models.
const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Configuration for constructing an [`OcrEngine`].
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Path to the text-detection model file (`.rten`).
    pub detection_model_path: PathBuf,
    /// Path to the text-recognition model file (`.rten`).
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    /// Returns a config pointing at the default model cache directory.
    fn default() -> Self {
        let dir = default_model_dir();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }
}

impl OcrConfig {
    /// Create a config with an explicit model directory.
    ///
    /// Expects the directory to contain `text-detection.rten` and
    /// `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Create a config pointing at two specific model files.
    pub fn from_paths(
        detection_model: impl Into<PathBuf>,
        recognition_model: impl Into<PathBuf>,
    ) -> Self {
        Self {
            detection_model_path: detection_model.into(),
            recognition_model_path: recognition_model.into(),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        if !self.detection_model_path.exists() {
            return Err(CartotecaError::OcrError(format!(
                "detection model not found at {}; run `ocrs-cli` once to download models",
                self.detection_model_path.display()
            )));
        }
        if !self.recognition_model_path.exists() {
            return Err(CartotecaError::OcrError(format!(
                "recognition model not found at {}; run `ocrs-cli` once to download models",
                self.recognition_model_path.display()
            )));
        }
        Ok(())
    }
}

/// OCR engine for letter scans.
///
/// Model loading is the expensive step — construct once, then call
/// [`recognize_file`](Self::recognize_file) for every image in the batch.
pub struct OcrEngine {
    engine: OcrsEngine,
}

impl OcrEngine {
    /// Create a new engine, loading models from the paths in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CartotecaError::OcrError`] if model files are missing or
    /// corrupt.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrConfig) -> Result<Self> {
        config.validate()?;

        info!("loading OCR detection model");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            CartotecaError::OcrError(format!(
                "failed to load detection model from {}: {}",
                config.detection_model_path.display(),
                err
            ))
        })?;

        info!("loading OCR recognition model");
        let recognition_model =
            Model::load_file(&config.recognition_model_path).map_err(|err| {
                CartotecaError::OcrError(format!(
                    "failed to load recognition model from {}: {}",
                    config.recognition_model_path.display(),
                    err
                ))
            })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| {
            CartotecaError::OcrError(format!("failed to initialise OCR engine: {}", err))
        })?;

        info!("OCR engine ready");
        Ok(Self { engine })
    }

    /// Create an engine using the default model cache directory.
    pub fn with_defaults() -> Result<Self> {
        Self::new(OcrConfig::default())
    }

    /// Recognize all text in a decoded image.
    ///
    /// Returns the text as a single string with lines separated by `\n`,
    /// untrimmed. The image is converted to RGB8 internally.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn recognize_text(&self, image: &DynamicImage) -> Result<String> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            CartotecaError::OcrError(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;

        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| CartotecaError::OcrError(format!("OCR preprocessing failed: {}", err)))?;

        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| CartotecaError::OcrError(format!("OCR recognition failed: {}", err)))?;

        debug!(
            line_count = text.lines().count(),
            char_count = text.len(),
            "recognition complete"
        );
        Ok(text)
    }

    /// Recognize the text of one image file, degrading to `""`.
    ///
    /// This is the batch contract: an unreadable file or a recognition
    /// failure logs a warning and yields an empty string so the rest of
    /// the corpus still gets processed. The result is trimmed; line breaks
    /// inside the letter are preserved.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn recognize_file(&self, path: &Path) -> String {
        let scan = match ScanImage::open(path) {
            Ok(scan) => scan,
            Err(err) => {
                warn!(error = %err, "unreadable image, recording empty text");
                return String::new();
            }
        };
        match self.recognize_text(scan.as_dynamic()) {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                warn!(error = %err, "recognition failed, recording empty text");
                String::new()
            }
        }
    }
}

impl TextRecognizer for OcrEngine {
    fn recognize(&self, image_path: &Path) -> String {
        self.recognize_file(image_path)
    }
}
