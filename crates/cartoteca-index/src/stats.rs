// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Aggregate counts over the letter index, logged after every build so a
// run's output can be judged without opening the artifacts.

use std::collections::BTreeMap;
use tracing::info;

use cartoteca_core::types::LetterRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusStats {
    pub total: usize,
    pub per_volume: BTreeMap<u32, usize>,
    /// Letters with a plausible publication year.
    pub with_year: usize,
    /// Letters carrying a full publication date.
    pub with_date: usize,
    pub subject_counts: BTreeMap<String, usize>,
}

impl CorpusStats {
    pub fn from_letters(letters: &[LetterRecord]) -> Self {
        let mut stats = Self {
            total: letters.len(),
            ..Self::default()
        };
        for letter in letters {
            *stats.per_volume.entry(letter.volume).or_insert(0) += 1;
            if letter.year.is_some() {
                stats.with_year += 1;
            }
            if letter.date_published.is_some() {
                stats.with_date += 1;
            }
            for subject in &letter.subjects {
                *stats.subject_counts.entry(subject.clone()).or_insert(0) += 1;
            }
        }
        stats
    }

    /// One info line overall, then one per volume and per subject.
    pub fn log_summary(&self) {
        info!(
            total = self.total,
            with_year = self.with_year,
            with_date = self.with_date,
            "index summary"
        );
        for (volume, count) in &self.per_volume {
            info!(volume, count, "letters in volume");
        }
        for (subject, count) in &self.subject_counts {
            info!(subject = subject.as_str(), count, "letters on subject");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter(
        volume: u32,
        year: Option<u16>,
        date: Option<&str>,
        subjects: &[&str],
    ) -> LetterRecord {
        LetterRecord {
            id: format!("vol{volume}_p001_img1"),
            volume,
            page: 1,
            year,
            date_published: date.map(str::to_string),
            image_path: format!("cartas/vol{volume}/vol{volume}_p001_img1.jpg"),
            text: String::new(),
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn counts_volumes_years_dates_and_subjects() {
        let letters = vec![
            letter(1, Some(1975), Some("15/03/1975"), &["Família", "Brasil"]),
            letter(1, None, None, &["General"]),
            letter(2, Some(2011), None, &["Família"]),
        ];
        let stats = CorpusStats::from_letters(&letters);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.per_volume.get(&1), Some(&2));
        assert_eq!(stats.per_volume.get(&2), Some(&1));
        assert_eq!(stats.with_year, 2);
        assert_eq!(stats.with_date, 1);
        assert_eq!(stats.subject_counts.get("Família"), Some(&2));
        assert_eq!(stats.subject_counts.get("Brasil"), Some(&1));
        assert_eq!(stats.subject_counts.get("General"), Some(&1));
    }

    #[test]
    fn empty_index_counts_to_zero() {
        let stats = CorpusStats::from_letters(&[]);
        assert_eq!(stats, CorpusStats::default());
    }
}
