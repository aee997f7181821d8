// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cartoteca Index — turns a curated image corpus into the letter index:
// metadata inference over recognized text, the two-artifact corpus state,
// and full/incremental index building.

pub mod builder;
pub mod infer;
pub mod state;
pub mod stats;
pub mod taxonomy;

pub use builder::IndexBuilder;
pub use infer::{LetterFacts, MetadataInferrer};
pub use state::{ArtifactPaths, CorpusState};
pub use stats::CorpusStats;
pub use taxonomy::{Taxonomy, Topic};
