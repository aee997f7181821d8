// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metadata inference — publication year, normalized publication date, and
// subject labels, all derived from the recognized text of one letter.
//
// Year attribution takes the first candidate that falls inside the
// volume's plausible range. A letter quoting several dates is therefore
// attributed to the first one mentioned; the corpus accepts that
// imprecision in exchange for never inventing a year the text does not
// contain.

use cartoteca_core::config::{MatchMode, YearRange};
use regex::Regex;

use crate::taxonomy::Taxonomy;

/// Everything inferred from one letter's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterFacts {
    pub year: Option<u16>,
    /// Zero-padded `dd/mm/yyyy`.
    pub date_published: Option<String>,
    /// Never empty.
    pub subjects: Vec<String>,
}

/// Compiles the date patterns once and carries the taxonomy; build one
/// per run and reuse it for every letter.
pub struct MetadataInferrer {
    full_date: Regex,
    bare_year: Regex,
    taxonomy: Taxonomy,
    match_mode: MatchMode,
}

impl MetadataInferrer {
    pub fn new(taxonomy: Taxonomy, match_mode: MatchMode) -> Self {
        let full_date = Regex::new(r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})\b")
            .expect("date pattern compiles");
        let bare_year = Regex::new(r"\b\d{4}\b").expect("year pattern compiles");
        Self {
            full_date,
            bare_year,
            taxonomy,
            match_mode,
        }
    }

    /// Infer year, date, and subjects in one pass over the text.
    pub fn infer(&self, text: &str, range: YearRange) -> LetterFacts {
        LetterFacts {
            year: self.infer_year(text, range),
            date_published: self.infer_date(text),
            subjects: self.taxonomy.classify(text, self.match_mode),
        }
    }

    /// First plausible year in the text.
    ///
    /// Full `d/m/yyyy` dates are scanned first, in text order; the first
    /// whose year the range accepts wins outright. Only when no full date
    /// qualifies do bare 4-digit runs get the same treatment.
    pub fn infer_year(&self, text: &str, range: YearRange) -> Option<u16> {
        for caps in self.full_date.captures_iter(text) {
            if let Ok(year) = caps[3].parse::<u16>()
                && range.contains(year)
            {
                return Some(year);
            }
        }
        for m in self.bare_year.find_iter(text) {
            if let Ok(year) = m.as_str().parse::<u16>()
                && range.contains(year)
            {
                return Some(year);
            }
        }
        None
    }

    /// First full date in the text, normalized to `dd/mm/yyyy`.
    ///
    /// Deliberately not gated by the year range: the publication date
    /// records what the letter says, even when the year attribution
    /// rejects it as implausible.
    pub fn infer_date(&self, text: &str) -> Option<String> {
        let caps = self.full_date.captures(text)?;
        let day: u8 = caps[1].parse().ok()?;
        let month: u8 = caps[2].parse().ok()?;
        Some(format!("{day:02}/{month:02}/{}", &caps[3]))
    }
}
