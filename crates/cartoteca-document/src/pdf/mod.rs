// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — walking scanned volume PDFs and extracting the embedded
// letter images.

pub mod extractor;

pub use extractor::VolumeExtractor;
