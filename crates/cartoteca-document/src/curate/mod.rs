// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Curation module — weeding the extracted corpus: undersized files,
// byte-identical duplicates, and the hand-maintained exclusion list.

pub mod curator;
pub mod exclusions;

pub use curator::{ImageCurator, RemovalReason, RemovedImage};
pub use exclusions::ExclusionList;
