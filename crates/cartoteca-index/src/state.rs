// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corpus state persistence.
//
// The image manifest and the letter index describe the same set of
// letters from two angles, and every consumer assumes they agree. All
// loading, saving, and repair of the pair goes through this module so
// the two artifacts only ever change together.

use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use cartoteca_core::config::PipelineConfig;
use cartoteca_core::error::{CartotecaError, Result};
use cartoteca_core::types::{ImageRecord, LetterIndex, LetterRecord};

/// Where the two corpus artifacts live for one checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub manifest: PathBuf,
    pub index: PathBuf,
}

impl ArtifactPaths {
    /// Resolve the configured artifact paths against a base directory.
    pub fn resolve(base_dir: &Path, config: &PipelineConfig) -> Self {
        Self {
            manifest: base_dir.join(&config.manifest_path),
            index: base_dir.join(&config.index_path),
        }
    }
}

/// The manifest and index artifacts, loaded as one value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusState {
    pub images: Vec<ImageRecord>,
    pub letters: Vec<LetterRecord>,
}

// Serialization view over borrowed letters; keeps `save` clone-free.
#[derive(Serialize)]
struct IndexView<'a> {
    cartas: &'a [LetterRecord],
}

impl CorpusState {
    /// Load both artifacts. Either file being absent is a
    /// [`CartotecaError::MissingArtifact`].
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let images: Vec<ImageRecord> = serde_json::from_str(&read_artifact(&paths.manifest)?)?;
        let index: LetterIndex = serde_json::from_str(&read_artifact(&paths.index)?)?;
        Ok(Self {
            images,
            letters: index.cartas,
        })
    }

    /// Write both artifacts, each replaced atomically.
    ///
    /// Both files are staged next to their targets before either rename,
    /// so a crash mid-save never leaves a half-written artifact. The pair
    /// can still land out of step if the process dies between the two
    /// renames; `verify` catches that.
    #[instrument(skip_all, fields(images = self.images.len(), letters = self.letters.len()))]
    pub fn save(&self, paths: &ArtifactPaths) -> Result<()> {
        let manifest_json = serde_json::to_string_pretty(&self.images)?;
        let index_json = serde_json::to_string_pretty(&IndexView {
            cartas: &self.letters,
        })?;

        let manifest_tmp = stage(&paths.manifest, &manifest_json)?;
        let index_tmp = stage(&paths.index, &index_json)?;
        fs::rename(&manifest_tmp, &paths.manifest)?;
        fs::rename(&index_tmp, &paths.index)?;

        info!(
            manifest = %paths.manifest.display(),
            index = %paths.index.display(),
            "corpus state saved"
        );
        Ok(())
    }

    /// Drop every record whose id is listed, from both sides.
    ///
    /// Returns how many records were dropped from the manifest and from
    /// the index.
    pub fn remove_ids(&mut self, ids: &HashSet<String>) -> (usize, usize) {
        let images_before = self.images.len();
        let letters_before = self.letters.len();
        self.images.retain(|record| !ids.contains(&record.id));
        self.letters.retain(|record| !ids.contains(&record.id));
        (
            images_before - self.images.len(),
            letters_before - self.letters.len(),
        )
    }

    /// Check that the pair is mutually consistent and backed by files.
    ///
    /// Every manifest image must be indexed, every indexed letter must be
    /// in the manifest, and every manifest path must exist under
    /// `base_dir`.
    pub fn verify(&self, base_dir: &Path) -> Result<()> {
        let image_ids: HashSet<&str> = self.images.iter().map(|r| r.id.as_str()).collect();
        let letter_ids: HashSet<&str> = self.letters.iter().map(|r| r.id.as_str()).collect();

        let mut problems = Vec::new();
        for record in &self.images {
            if !letter_ids.contains(record.id.as_str()) {
                problems.push(format!("{} is in the manifest but not the index", record.id));
            }
            if !base_dir.join(&record.path).is_file() {
                problems.push(format!("{} is missing its file {}", record.id, record.path));
            }
        }
        for record in &self.letters {
            if !image_ids.contains(record.id.as_str()) {
                problems.push(format!("{} is in the index but not the manifest", record.id));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(CartotecaError::Inconsistency(problems.join("; ")))
        }
    }
}

// -- Single-artifact helpers -------------------------------------------------

/// Load just the manifest artifact.
pub fn load_manifest(path: &Path) -> Result<Vec<ImageRecord>> {
    Ok(serde_json::from_str(&read_artifact(path)?)?)
}

/// Atomically rewrite just the manifest artifact.
pub fn save_manifest(path: &Path, records: &[ImageRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    let tmp = stage(path, &json)?;
    fs::rename(&tmp, path)?;
    info!(records = records.len(), path = %path.display(), "manifest saved");
    Ok(())
}

/// Propagate a set of removed image ids into whichever artifacts exist.
///
/// Curation runs before the first index build, so an absent index is
/// normal: only the manifest is filtered then. An index without a
/// manifest has lost its source of truth and is reported as missing.
/// Returns how many records were dropped from the manifest and index.
#[instrument(skip_all, fields(removed = removed_ids.len()))]
pub fn repair_removals(
    paths: &ArtifactPaths,
    removed_ids: &HashSet<String>,
) -> Result<(usize, usize)> {
    match (paths.manifest.is_file(), paths.index.is_file()) {
        (false, false) => {
            debug!("no artifacts on disk, nothing to repair");
            Ok((0, 0))
        }
        (true, false) => {
            let mut images = load_manifest(&paths.manifest)?;
            let before = images.len();
            images.retain(|record| !removed_ids.contains(&record.id));
            let dropped = before - images.len();
            save_manifest(&paths.manifest, &images)?;
            info!(dropped, "manifest repaired, index not built yet");
            Ok((dropped, 0))
        }
        (false, true) => Err(CartotecaError::MissingArtifact(format!(
            "index {} exists without manifest {}",
            paths.index.display(),
            paths.manifest.display()
        ))),
        (true, true) => {
            let mut state = CorpusState::load(paths)?;
            let (from_manifest, from_index) = state.remove_ids(removed_ids);
            state.save(paths)?;
            info!(from_manifest, from_index, "both artifacts repaired");
            Ok((from_manifest, from_index))
        }
    }
}

fn read_artifact(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            CartotecaError::MissingArtifact(path.display().to_string())
        } else {
            CartotecaError::Io(err)
        }
    })
}

// Stage contents in a sibling file, creating parent directories on the way.
fn stage(path: &Path, contents: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    Ok(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(volume: u32, page: u32, ordinal: u32) -> ImageRecord {
        let id = cartoteca_core::types::format_image_id(volume, page, ordinal);
        ImageRecord::new(volume, page, ordinal, format!("cartas/vol{volume}/{id}.jpg"))
    }

    fn letter(volume: u32, page: u32, ordinal: u32, year: Option<u16>) -> LetterRecord {
        let record = image(volume, page, ordinal);
        LetterRecord {
            id: record.id.clone(),
            volume,
            page,
            year,
            date_published: None,
            image_path: record.path,
            text: "querido amigo".into(),
            subjects: vec!["General".into()],
        }
    }

    fn sample_paths(base: &Path) -> ArtifactPaths {
        ArtifactPaths::resolve(base, &PipelineConfig::default())
    }

    #[test]
    fn state_round_trips_and_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = sample_paths(dir.path());

        let state = CorpusState {
            images: vec![image(1, 1, 1), image(2, 5, 1)],
            letters: vec![letter(1, 1, 1, Some(1975)), letter(2, 5, 1, None)],
        };
        state.save(&paths).expect("save state");

        assert!(paths.manifest.is_file());
        assert!(paths.index.is_file());
        let back = CorpusState::load(&paths).expect("load state");
        assert_eq!(back, state);
    }

    #[test]
    fn save_leaves_no_staging_files_behind() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = sample_paths(dir.path());

        let state = CorpusState {
            images: vec![image(1, 1, 1)],
            letters: vec![letter(1, 1, 1, None)],
        };
        state.save(&paths).expect("save state");

        for artifact in [&paths.manifest, &paths.index] {
            let parent = artifact.parent().expect("artifact has a parent");
            for entry in fs::read_dir(parent).expect("list artifact dir") {
                let name = entry.expect("read dir entry").file_name();
                assert!(
                    !name.to_string_lossy().ends_with(".tmp"),
                    "staging file left behind: {name:?}"
                );
            }
        }
    }

    #[test]
    fn unknown_year_is_written_as_json_null() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = sample_paths(dir.path());

        let state = CorpusState {
            images: vec![image(1, 10, 1)],
            letters: vec![letter(1, 10, 1, None)],
        };
        state.save(&paths).expect("save state");

        let raw = fs::read_to_string(&paths.index).expect("read index");
        assert!(raw.contains("\"ano\": null"));
        assert!(raw.contains("\"data_publicacao\": null"));
    }

    #[test]
    fn remove_ids_filters_both_sides_and_reports_counts() {
        let mut state = CorpusState {
            images: vec![image(1, 1, 1), image(1, 2, 1), image(1, 3, 1)],
            letters: vec![letter(1, 1, 1, None), letter(1, 3, 1, None)],
        };
        let removed: HashSet<String> =
            ["vol1_p002_img1".to_string(), "vol1_p003_img1".to_string()].into();

        let (from_manifest, from_index) = state.remove_ids(&removed);

        assert_eq!((from_manifest, from_index), (2, 1));
        assert_eq!(state.images.len(), 1);
        assert_eq!(state.images[0].id, "vol1_p001_img1");
        assert_eq!(state.letters.len(), 1);
        assert_eq!(state.letters[0].id, "vol1_p001_img1");
    }

    #[test]
    fn load_without_manifest_reports_the_missing_artifact() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = sample_paths(dir.path());

        let err = CorpusState::load(&paths).expect_err("nothing on disk");
        assert!(matches!(err, CartotecaError::MissingArtifact(_)));
    }

    #[test]
    fn verify_accepts_a_consistent_backed_corpus() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let record = image(1, 1, 1);
        let file = dir.path().join(&record.path);
        fs::create_dir_all(file.parent().expect("has parent")).expect("make image dir");
        fs::write(&file, b"jpeg bytes").expect("write image");

        let state = CorpusState {
            images: vec![record],
            letters: vec![letter(1, 1, 1, Some(1990))],
        };
        state.verify(dir.path()).expect("consistent corpus");
    }

    #[test]
    fn verify_reports_divergent_ids_in_both_directions() {
        let dir = tempfile::tempdir().expect("create temp dir");
        for record in [image(1, 1, 1), image(1, 2, 1)] {
            let file = dir.path().join(&record.path);
            fs::create_dir_all(file.parent().expect("has parent")).expect("make image dir");
            fs::write(&file, b"jpeg bytes").expect("write image");
        }

        let state = CorpusState {
            images: vec![image(1, 1, 1), image(1, 2, 1)],
            letters: vec![letter(1, 1, 1, None), letter(1, 9, 1, None)],
        };
        let err = state.verify(dir.path()).expect_err("ids diverge");
        let message = err.to_string();
        assert!(message.contains("vol1_p002_img1"));
        assert!(message.contains("vol1_p009_img1"));
    }

    #[test]
    fn verify_reports_records_without_backing_files() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let state = CorpusState {
            images: vec![image(2, 7, 1)],
            letters: vec![letter(2, 7, 1, None)],
        };
        let err = state.verify(dir.path()).expect_err("file never written");
        assert!(err.to_string().contains("vol2_p007_img1"));
    }

    #[test]
    fn repair_with_no_artifacts_is_a_no_op() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = sample_paths(dir.path());
        let removed: HashSet<String> = ["vol1_p001_img1".to_string()].into();

        let counts = repair_removals(&paths, &removed).expect("nothing to do");
        assert_eq!(counts, (0, 0));
        assert!(!paths.manifest.exists());
        assert!(!paths.index.exists());
    }

    #[test]
    fn repair_with_manifest_only_filters_just_the_manifest() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = sample_paths(dir.path());
        save_manifest(&paths.manifest, &[image(1, 1, 1), image(1, 2, 1)])
            .expect("seed manifest");

        let removed: HashSet<String> = ["vol1_p002_img1".to_string()].into();
        let counts = repair_removals(&paths, &removed).expect("repair manifest");

        assert_eq!(counts, (1, 0));
        assert!(!paths.index.exists());
        let images = load_manifest(&paths.manifest).expect("reload manifest");
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, "vol1_p001_img1");
    }

    #[test]
    fn repair_filters_both_artifacts_when_both_exist() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = sample_paths(dir.path());
        let state = CorpusState {
            images: vec![image(1, 1, 1), image(1, 2, 1)],
            letters: vec![letter(1, 1, 1, None), letter(1, 2, 1, None)],
        };
        state.save(&paths).expect("seed artifacts");

        let removed: HashSet<String> = ["vol1_p001_img1".to_string()].into();
        let counts = repair_removals(&paths, &removed).expect("repair both");

        assert_eq!(counts, (1, 1));
        let back = CorpusState::load(&paths).expect("reload state");
        assert_eq!(back.images.len(), 1);
        assert_eq!(back.letters.len(), 1);
        assert_eq!(back.images[0].id, "vol1_p002_img1");
        assert_eq!(back.letters[0].id, "vol1_p002_img1");
    }

    #[test]
    fn repair_rejects_an_index_without_a_manifest() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = sample_paths(dir.path());
        fs::create_dir_all(paths.index.parent().expect("has parent")).expect("make data dir");
        fs::write(&paths.index, r#"{ "cartas": [] }"#).expect("write index");

        let err = repair_removals(&paths, &HashSet::new()).expect_err("manifest is gone");
        assert!(matches!(err, CartotecaError::MissingArtifact(_)));
    }
}
