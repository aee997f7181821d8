// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Index building.
//
// Turns curated JPEGs into the letter index, either incrementally from
// the existing manifest or from scratch by walking the volume
// directories. Both paths end in one transactional save of the
// manifest/index pair.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use cartoteca_core::config::PipelineConfig;
use cartoteca_core::error::Result;
use cartoteca_core::types::{ImageRecord, LetterRecord, TextRecognizer, parse_image_id, portable_path};

use crate::infer::MetadataInferrer;
use crate::state::{self, ArtifactPaths, CorpusState};
use crate::stats::CorpusStats;
use crate::taxonomy::Taxonomy;

/// Builds the corpus artifacts from images plus a text recognizer.
///
/// Generic over the recognizer so index construction can be tested with
/// canned text instead of a live OCR engine.
pub struct IndexBuilder<R: TextRecognizer> {
    config: PipelineConfig,
    recognizer: R,
    inferrer: MetadataInferrer,
}

impl<R: TextRecognizer> IndexBuilder<R> {
    pub fn new(config: PipelineConfig, taxonomy: Taxonomy, recognizer: R) -> Self {
        let inferrer = MetadataInferrer::new(taxonomy, config.match_mode);
        Self {
            config,
            recognizer,
            inferrer,
        }
    }

    /// Build the letter index from the existing manifest.
    ///
    /// The manifest must exist; without it nothing is written. Entries
    /// whose file has vanished since extraction are dropped rather than
    /// indexed blind, and the rewritten manifest no longer lists them.
    #[instrument(skip_all, fields(base_dir = %base_dir.display()))]
    pub fn build_from_manifest(&self, base_dir: &Path) -> Result<CorpusState> {
        let paths = ArtifactPaths::resolve(base_dir, &self.config);
        let manifest = state::load_manifest(&paths.manifest)?;
        info!(entries = manifest.len(), "indexing letters from manifest");

        let mut images = Vec::with_capacity(manifest.len());
        let mut letters = Vec::with_capacity(manifest.len());
        for record in manifest {
            let file = base_dir.join(&record.path);
            if !file.is_file() {
                warn!(id = %record.id, path = %record.path, "manifest entry has no file, dropping");
                continue;
            }
            let letter = self.letter_for(&record, &file)?;
            images.push(record);
            letters.push(letter);
        }

        let corpus = CorpusState { images, letters };
        corpus.save(&paths)?;
        CorpusStats::from_letters(&corpus.letters).log_summary();
        Ok(corpus)
    }

    /// Rebuild both artifacts from the JPEGs on disk.
    ///
    /// Walks each configured volume directory in filename order and
    /// re-derives every record from the canonical names, replacing
    /// whatever artifacts were there before. Files outside the naming
    /// scheme are skipped with a warning.
    #[instrument(skip_all, fields(base_dir = %base_dir.display()))]
    pub fn rebuild(&self, base_dir: &Path) -> Result<CorpusState> {
        let paths = ArtifactPaths::resolve(base_dir, &self.config);
        let mut images = Vec::new();
        let mut letters = Vec::new();

        for volume in &self.config.volumes {
            let vol_dir = base_dir.join(self.config.volume_dir(volume.number));
            if !vol_dir.is_dir() {
                warn!(
                    volume = volume.number,
                    dir = %vol_dir.display(),
                    "volume directory missing, skipping"
                );
                continue;
            }
            for file in sorted_jpgs(&vol_dir)? {
                let Some(stem) = file.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let Some((parsed_volume, page, _ordinal)) = parse_image_id(stem) else {
                    warn!(file = %file.display(), "filename is not an image id, skipping");
                    continue;
                };
                if parsed_volume != volume.number {
                    warn!(
                        file = %file.display(),
                        volume = volume.number,
                        "id names a different volume, skipping"
                    );
                    continue;
                }
                // The stem on disk is the id; dimensions are an
                // extraction-time measurement and stay unknown here.
                let record = ImageRecord {
                    id: stem.to_string(),
                    volume: volume.number,
                    page,
                    path: portable_path(
                        &self.config.volume_dir(volume.number).join(format!("{stem}.jpg")),
                    ),
                    width: None,
                    height: None,
                };
                let letter = self.letter_for(&record, &file)?;
                images.push(record);
                letters.push(letter);
            }
        }

        info!(images = images.len(), "corpus rebuilt from disk");
        let corpus = CorpusState { images, letters };
        corpus.save(&paths)?;
        CorpusStats::from_letters(&corpus.letters).log_summary();
        Ok(corpus)
    }

    // Recognize one image and attach everything inferred from its text.
    fn letter_for(&self, record: &ImageRecord, file: &Path) -> Result<LetterRecord> {
        let range = self.config.volume(record.volume)?.year_range();
        let text = self.recognizer.recognize(file);
        let facts = self.inferrer.infer(&text, range);
        debug!(
            id = %record.id,
            year = ?facts.year,
            subjects = facts.subjects.len(),
            "letter indexed"
        );
        Ok(LetterRecord {
            id: record.id.clone(),
            volume: record.volume,
            page: record.page,
            year: facts.year,
            date_published: facts.date_published,
            image_path: record.path.clone(),
            text,
            subjects: facts.subjects,
        })
    }
}

// Sorted so a rebuild is deterministic across filesystems.
fn sorted_jpgs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("jpg") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
