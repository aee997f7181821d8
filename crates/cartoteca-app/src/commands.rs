// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline commands. Each function wires the processing crates together
// for one subcommand, keeping the binary itself a thin dispatch layer.

use std::collections::HashSet;
use std::path::Path;

use tracing::{error, info, warn};

use cartoteca_core::config::{PipelineConfig, VolumeConfig};
use cartoteca_core::error::{CartotecaError, Result};
use cartoteca_core::types::{ImageRecord, parse_image_id};
use cartoteca_document::curate::RemovedImage;
use cartoteca_document::{ExclusionList, ImageCurator, OcrConfig, OcrEngine, VolumeExtractor};
use cartoteca_index::state::{self, ArtifactPaths, CorpusState};
use cartoteca_index::{IndexBuilder, Taxonomy};

/// Load the pipeline configuration, or fall back to the built-in
/// defaults when no file was named.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading pipeline configuration");
            PipelineConfig::from_file(path)
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Extract embedded images from the volume PDFs into the image tree and
/// write the extraction manifest.
///
/// One volume failing to open or extract does not stop the others; the
/// manifest covers every volume that succeeded, and the command fails
/// afterwards if anything was skipped.
pub fn extract(
    config: &PipelineConfig,
    base_dir: &Path,
    only_volume: Option<u32>,
    pdf_override: Option<&Path>,
) -> Result<()> {
    let mut extracted = Vec::new();
    let mut covered = HashSet::new();
    let mut failures = 0usize;

    for volume in volumes_to_extract(config, only_volume)? {
        let pdf = match pdf_override {
            Some(path) => path.to_path_buf(),
            None => match &volume.source_pdf {
                Some(path) => base_dir.join(path),
                None => {
                    warn!(volume = volume.number, "no source PDF configured, skipping");
                    continue;
                }
            },
        };

        match extract_volume(config, &pdf, volume.number, base_dir) {
            Ok(records) => {
                info!(volume = volume.number, records = records.len(), "volume extracted");
                covered.insert(volume.number);
                extracted.extend(records);
            }
            Err(err) => {
                error!(volume = volume.number, error = %err, "volume extraction failed");
                failures += 1;
            }
        }
    }

    if !covered.is_empty() {
        let manifest_path = base_dir.join(&config.manifest_path);
        let merged = merge_manifest(manifest_or_empty(&manifest_path)?, &covered, extracted);
        state::save_manifest(&manifest_path, &merged)?;
    }

    if failures > 0 {
        return Err(CartotecaError::PdfError(format!(
            "{failures} volume(s) failed to extract"
        )));
    }
    Ok(())
}

/// Remove undersized files and byte-identical duplicates from every
/// volume directory, then repair the artifacts.
pub fn curate(config: &PipelineConfig, base_dir: &Path) -> Result<()> {
    let curator = ImageCurator::new(config);
    let mut removed = Vec::new();
    for volume in &config.volumes {
        let vol_dir = base_dir.join(config.volume_dir(volume.number));
        removed.extend(curator.curate_volume(&vol_dir)?);
    }
    repair_after(config, base_dir, &removed)
}

/// Delete the images the curated exclusion list names, then repair the
/// artifacts.
pub fn prune(config: &PipelineConfig, base_dir: &Path) -> Result<()> {
    let exclusions = match &config.exclusions_path {
        Some(path) => ExclusionList::from_file(&base_dir.join(path))?,
        None => ExclusionList::default(),
    };
    let curator = ImageCurator::new(config);
    let removed = curator.remove_excluded(&base_dir.join(&config.images_dir), &exclusions)?;
    repair_after(config, base_dir, &removed)
}

/// Recognize and index every image the manifest lists.
pub fn index(config: &PipelineConfig, base_dir: &Path, models: Option<&Path>) -> Result<()> {
    let builder = index_builder(config, base_dir, models)?;
    let corpus = builder.build_from_manifest(base_dir)?;
    info!(letters = corpus.letters.len(), "index build complete");
    Ok(())
}

/// Rebuild the manifest and index from the images on disk.
pub fn reindex(config: &PipelineConfig, base_dir: &Path, models: Option<&Path>) -> Result<()> {
    let builder = index_builder(config, base_dir, models)?;
    let corpus = builder.rebuild(base_dir)?;
    info!(letters = corpus.letters.len(), "reindex complete");
    Ok(())
}

/// Check that the manifest, the index, and the files on disk agree.
pub fn verify(config: &PipelineConfig, base_dir: &Path) -> Result<()> {
    let paths = ArtifactPaths::resolve(base_dir, config);
    let corpus = CorpusState::load(&paths)?;
    corpus.verify(base_dir)?;
    info!(
        images = corpus.images.len(),
        letters = corpus.letters.len(),
        "corpus artifacts are consistent"
    );
    Ok(())
}

// -- Wiring ------------------------------------------------------------------

fn volumes_to_extract(
    config: &PipelineConfig,
    only: Option<u32>,
) -> Result<Vec<&VolumeConfig>> {
    match only {
        Some(number) => Ok(vec![config.volume(number)?]),
        None => Ok(config.volumes.iter().collect()),
    }
}

fn extract_volume(
    config: &PipelineConfig,
    pdf: &Path,
    volume: u32,
    base_dir: &Path,
) -> Result<Vec<ImageRecord>> {
    let extractor = VolumeExtractor::open(pdf, volume, config)?;
    extractor.extract(base_dir, &config.images_dir)
}

fn index_builder(
    config: &PipelineConfig,
    base_dir: &Path,
    models: Option<&Path>,
) -> Result<IndexBuilder<OcrEngine>> {
    let engine = match models {
        Some(dir) => OcrEngine::new(OcrConfig::from_dir(dir))?,
        None => OcrEngine::with_defaults()?,
    };
    let taxonomy = match &config.taxonomy_path {
        Some(path) => Taxonomy::from_file(&base_dir.join(path))?,
        None => Taxonomy::default(),
    };
    Ok(IndexBuilder::new(config.clone(), taxonomy, engine))
}

// Propagate removals into whichever artifacts exist and report totals.
fn repair_after(config: &PipelineConfig, base_dir: &Path, removed: &[RemovedImage]) -> Result<()> {
    let ids: HashSet<String> = removed.iter().map(|r| r.id.clone()).collect();
    let paths = ArtifactPaths::resolve(base_dir, config);
    let (from_manifest, from_index) = state::repair_removals(&paths, &ids)?;
    info!(
        removed = removed.len(),
        from_manifest, from_index, "removal pass finished"
    );
    Ok(())
}

fn manifest_or_empty(path: &Path) -> Result<Vec<ImageRecord>> {
    if path.is_file() {
        state::load_manifest(path)
    } else {
        Ok(Vec::new())
    }
}

// Replace the entries of re-extracted volumes and keep the rest, sorted
// numerically by volume, page, and image ordinal.
fn merge_manifest(
    existing: Vec<ImageRecord>,
    replaced_volumes: &HashSet<u32>,
    new_records: Vec<ImageRecord>,
) -> Vec<ImageRecord> {
    let mut merged: Vec<ImageRecord> = existing
        .into_iter()
        .filter(|record| !replaced_volumes.contains(&record.volume))
        .collect();
    merged.extend(new_records);
    merged.sort_by_key(|record| {
        let ordinal = parse_image_id(&record.id).map(|(_, _, k)| k).unwrap_or(0);
        (record.volume, record.page, ordinal)
    });
    merged
}
