// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Cartoteca.

use thiserror::Error;

/// Top-level error type for all Cartoteca operations.
#[derive(Debug, Error)]
pub enum CartotecaError {
    // -- Extraction errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Recognition errors --
    #[error("OCR failed: {0}")]
    OcrError(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown volume: {0}")]
    UnknownVolume(u32),

    // -- Artifacts / persistence --
    #[error("missing prerequisite artifact: {0}")]
    MissingArtifact(String),

    #[error("corpus artifacts are inconsistent: {0}")]
    Inconsistency(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CartotecaError>;
