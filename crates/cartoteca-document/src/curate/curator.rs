// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image curator — removes files the corpus should not carry and reports
// every removal so the manifest and letter index can be repaired.
//
// All passes iterate filenames in ascending order. That makes the
// duplicate tie-break deterministic: the alphabetically earliest file with
// a given content hash survives.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cartoteca_core::config::PipelineConfig;
use cartoteca_core::error::Result;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use super::exclusions::ExclusionList;

/// Why a file was curated away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalReason {
    /// File size below the configured byte floor.
    Undersized { bytes: u64 },
    /// Byte-identical to an earlier file; `kept` names the survivor.
    Duplicate { kept: String },
    /// Named by the curated exclusion list.
    Excluded,
}

/// One file removed during curation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedImage {
    /// Id derived from the filename stem.
    pub id: String,
    pub path: PathBuf,
    pub reason: RemovalReason,
}

/// Removes corpus files that fail the configured checks.
pub struct ImageCurator {
    min_file_bytes: u64,
}

impl ImageCurator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            min_file_bytes: config.min_file_bytes,
        }
    }

    /// Run the size and duplicate filters over one volume directory in a
    /// single sorted pass. Returns every removal; running again on the
    /// result removes nothing.
    #[instrument(skip_all, fields(dir = %vol_dir.display()))]
    pub fn curate_volume(&self, vol_dir: &Path) -> Result<Vec<RemovedImage>> {
        let files = match sorted_jpgs(vol_dir)? {
            Some(files) => files,
            None => return Ok(Vec::new()),
        };

        let mut removed = Vec::new();
        let mut seen: HashMap<String, String> = HashMap::new();

        for path in files {
            let bytes = std::fs::metadata(&path)?.len();
            if bytes < self.min_file_bytes {
                debug!(path = %path.display(), bytes, "removing undersized file");
                std::fs::remove_file(&path)?;
                removed.push(RemovedImage {
                    id: stem_of(&path),
                    path,
                    reason: RemovalReason::Undersized { bytes },
                });
                continue;
            }

            let hash = hash_file(&path)?;
            match seen.get(&hash) {
                Some(kept) => {
                    debug!(path = %path.display(), kept, "removing duplicate file");
                    std::fs::remove_file(&path)?;
                    removed.push(RemovedImage {
                        id: stem_of(&path),
                        path,
                        reason: RemovalReason::Duplicate { kept: kept.clone() },
                    });
                }
                None => {
                    seen.insert(hash, stem_of(&path));
                }
            }
        }

        info!(removed = removed.len(), "volume curation pass complete");
        Ok(removed)
    }

    /// Remove only files below the byte floor.
    #[instrument(skip_all, fields(dir = %vol_dir.display()))]
    pub fn remove_undersized(&self, vol_dir: &Path) -> Result<Vec<RemovedImage>> {
        let files = match sorted_jpgs(vol_dir)? {
            Some(files) => files,
            None => return Ok(Vec::new()),
        };

        let mut removed = Vec::new();
        for path in files {
            let bytes = std::fs::metadata(&path)?.len();
            if bytes < self.min_file_bytes {
                std::fs::remove_file(&path)?;
                removed.push(RemovedImage {
                    id: stem_of(&path),
                    path,
                    reason: RemovalReason::Undersized { bytes },
                });
            }
        }
        Ok(removed)
    }

    /// Remove only byte-identical duplicates, keeping the first filename
    /// encountered for each content hash.
    #[instrument(skip_all, fields(dir = %vol_dir.display()))]
    pub fn remove_duplicates(&self, vol_dir: &Path) -> Result<Vec<RemovedImage>> {
        let files = match sorted_jpgs(vol_dir)? {
            Some(files) => files,
            None => return Ok(Vec::new()),
        };

        let mut removed = Vec::new();
        let mut seen: HashMap<String, String> = HashMap::new();

        for path in files {
            let hash = hash_file(&path)?;
            match seen.get(&hash) {
                Some(kept) => {
                    std::fs::remove_file(&path)?;
                    removed.push(RemovedImage {
                        id: stem_of(&path),
                        path,
                        reason: RemovalReason::Duplicate { kept: kept.clone() },
                    });
                }
                None => {
                    seen.insert(hash, stem_of(&path));
                }
            }
        }
        Ok(removed)
    }

    /// Delete every file the exclusion list names, resolved against
    /// `images_root`. Entries whose file is already gone are not errors.
    #[instrument(skip_all, fields(root = %images_root.display(), entries = exclusions.len()))]
    pub fn remove_excluded(
        &self,
        images_root: &Path,
        exclusions: &ExclusionList,
    ) -> Result<Vec<RemovedImage>> {
        let mut removed = Vec::new();

        for relative in exclusions.iter() {
            let path = images_root.join(relative);
            if !path.is_file() {
                debug!(path = %path.display(), "excluded file already absent");
                continue;
            }
            warn!(path = %path.display(), "removing excluded image");
            std::fs::remove_file(&path)?;
            removed.push(RemovedImage {
                id: stem_of(&path),
                path,
                reason: RemovalReason::Excluded,
            });
        }

        info!(removed = removed.len(), "exclusion pass complete");
        Ok(removed)
    }
}

/// List the `.jpg` files of a directory in ascending filename order.
/// `None` when the directory does not exist (volume not extracted yet).
fn sorted_jpgs(dir: &Path) -> Result<Option<Vec<PathBuf>>> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "volume directory missing, nothing to curate");
        return Ok(None);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("jpg") {
            files.push(path);
        }
    }
    files.sort();
    Ok(Some(files))
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// SHA-256 of a file's contents, hex encoded.
fn hash_file(path: &Path) -> Result<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curator_with_floor(min_file_bytes: u64) -> ImageCurator {
        let config = PipelineConfig {
            min_file_bytes,
            ..PipelineConfig::default()
        };
        ImageCurator::new(&config)
    }

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).expect("write test file");
        path
    }

    #[test]
    fn undersized_files_are_removed() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write_file(dir.path(), "vol1_p001_img1.jpg", &[0u8; 10]);
        let kept = write_file(dir.path(), "vol1_p002_img1.jpg", &[1u8; 500]);

        let curator = curator_with_floor(100);
        let removed = curator.curate_volume(dir.path()).expect("curate");

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, "vol1_p001_img1");
        assert!(matches!(
            removed[0].reason,
            RemovalReason::Undersized { bytes: 10 }
        ));
        assert!(kept.exists());
    }

    #[test]
    fn duplicate_keeps_alphabetically_first_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let first = write_file(dir.path(), "vol1_p001_img1.jpg", &[7u8; 300]);
        write_file(dir.path(), "vol1_p002_img1.jpg", &[7u8; 300]);
        let unique = write_file(dir.path(), "vol1_p003_img1.jpg", &[9u8; 300]);

        let curator = curator_with_floor(100);
        let removed = curator.curate_volume(dir.path()).expect("curate");

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, "vol1_p002_img1");
        assert_eq!(
            removed[0].reason,
            RemovalReason::Duplicate {
                kept: "vol1_p001_img1".into()
            }
        );
        assert!(first.exists());
        assert!(unique.exists());
    }

    #[test]
    fn curation_is_idempotent() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write_file(dir.path(), "vol1_p001_img1.jpg", &[0u8; 10]);
        write_file(dir.path(), "vol1_p001_img2.jpg", &[7u8; 300]);
        write_file(dir.path(), "vol1_p002_img1.jpg", &[7u8; 300]);

        let curator = curator_with_floor(100);
        let first_pass = curator.curate_volume(dir.path()).expect("first pass");
        assert_eq!(first_pass.len(), 2);

        let second_pass = curator.curate_volume(dir.path()).expect("second pass");
        assert!(second_pass.is_empty(), "second pass must remove nothing");
    }

    #[test]
    fn non_jpg_files_are_left_alone() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let notes = write_file(dir.path(), "notes.txt", &[0u8; 5]);

        let curator = curator_with_floor(100);
        let removed = curator.curate_volume(dir.path()).expect("curate");

        assert!(removed.is_empty());
        assert!(notes.exists());
    }

    #[test]
    fn missing_directory_curates_nothing() {
        let curator = curator_with_floor(100);
        let removed = curator
            .curate_volume(Path::new("/nonexistent/cartas/vol9"))
            .expect("curate missing dir");
        assert!(removed.is_empty());
    }

    #[test]
    fn exclusion_list_removes_present_files_and_skips_absent_ones() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let vol1 = dir.path().join("vol1");
        std::fs::create_dir_all(&vol1).expect("create vol dir");
        write_file(&vol1, "vol1_p220_img6.jpg", &[3u8; 300]);

        let exclusions = ExclusionList::from_entries(vec![
            "vol1/vol1_p220_img6.jpg".into(),
            "vol2/vol2_p363_img1.jpg".into(),
        ]);

        let curator = curator_with_floor(100);
        let removed = curator
            .remove_excluded(dir.path(), &exclusions)
            .expect("apply exclusions");

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, "vol1_p220_img6");
        assert_eq!(removed[0].reason, RemovalReason::Excluded);
        assert!(!vol1.join("vol1_p220_img6.jpg").exists());
    }
}
