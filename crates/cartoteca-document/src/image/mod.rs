// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decoding, 3-channel normalization, and JPEG output.

pub mod scan_image;

pub use scan_image::ScanImage;
