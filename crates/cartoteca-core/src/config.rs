// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.
//
// Every component receives its thresholds from here instead of reading
// module-level constants, so tests can override them and deployments can
// ship a JSON config file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CartotecaError, Result};

/// Inclusive range of plausible publication years for one volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub min: u16,
    pub max: u16,
}

impl YearRange {
    pub fn contains(&self, year: u16) -> bool {
        year >= self.min && year <= self.max
    }
}

/// How taxonomy keywords are matched against recognized text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Plain substring containment (matches the archive's historic runs).
    #[default]
    Substring,
    /// Keyword must be delimited by non-alphanumeric characters.
    WordBoundary,
}

/// One source volume of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Volume number, used in ids, filenames, and directory names.
    pub number: u32,
    /// PDF to extract this volume from; `None` for index-only runs.
    pub source_pdf: Option<PathBuf>,
    /// Earliest plausible publication year.
    pub year_min: u16,
    /// Latest plausible publication year.
    pub year_max: u16,
}

impl VolumeConfig {
    pub fn year_range(&self) -> YearRange {
        YearRange {
            min: self.year_min,
            max: self.year_max,
        }
    }
}

/// Persistent pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root directory the per-volume image directories live under.
    pub images_dir: PathBuf,
    /// Path of the image manifest artifact.
    pub manifest_path: PathBuf,
    /// Path of the letter index artifact.
    pub index_path: PathBuf,
    /// Minimum pixel width for an extracted image to be kept.
    pub min_width: u32,
    /// Minimum pixel height for an extracted image to be kept.
    pub min_height: u32,
    /// JPEG quality for normalized output.
    pub jpeg_quality: u8,
    /// Files smaller than this many bytes are curated away.
    pub min_file_bytes: u64,
    /// Keyword matching strictness for subject classification.
    pub match_mode: MatchMode,
    /// The volumes making up the corpus.
    pub volumes: Vec<VolumeConfig>,
    /// Optional replacement for the built-in subject taxonomy.
    pub taxonomy_path: Option<PathBuf>,
    /// Optional replacement for the built-in exclusion list.
    pub exclusions_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("cartas"),
            manifest_path: PathBuf::from("cartas/manifest.json"),
            index_path: PathBuf::from("data/cartas.json"),
            min_width: 200,
            min_height: 200,
            jpeg_quality: 90,
            min_file_bytes: 50 * 1024,
            match_mode: MatchMode::Substring,
            volumes: vec![
                VolumeConfig {
                    number: 1,
                    source_pdf: None,
                    year_min: 1958,
                    year_max: 2008,
                },
                VolumeConfig {
                    number: 2,
                    source_pdf: None,
                    year_min: 2009,
                    year_max: 2025,
                },
            ],
            taxonomy_path: None,
            exclusions_path: None,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file.
    ///
    /// Missing fields fall back to the defaults above, so a config file
    /// only needs to name what it overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no run could make sense of.
    pub fn validate(&self) -> Result<()> {
        if self.volumes.is_empty() {
            return Err(CartotecaError::Config("no volumes configured".into()));
        }
        for volume in &self.volumes {
            if volume.year_min > volume.year_max {
                return Err(CartotecaError::Config(format!(
                    "volume {}: year range [{}, {}] is inverted",
                    volume.number, volume.year_min, volume.year_max
                )));
            }
        }
        Ok(())
    }

    /// Look up a configured volume by number.
    pub fn volume(&self, number: u32) -> Result<&VolumeConfig> {
        self.volumes
            .iter()
            .find(|v| v.number == number)
            .ok_or(CartotecaError::UnknownVolume(number))
    }

    /// Directory holding the JPEGs of one volume.
    pub fn volume_dir(&self, number: u32) -> PathBuf {
        self.images_dir.join(crate::types::volume_dir_name(number))
    }
}
