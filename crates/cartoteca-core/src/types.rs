// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Cartoteca letters pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Format the canonical id for an extracted image: `vol{V}_p{PPP}_img{K}`.
///
/// The id doubles as the JPEG filename stem, so page numbers are
/// zero-padded to keep lexicographic and numeric page order identical.
pub fn format_image_id(volume: u32, page: u32, ordinal: u32) -> String {
    format!("vol{volume}_p{page:03}_img{ordinal}")
}

/// Parse `(volume, page, ordinal)` back out of an id or filename stem.
///
/// Returns `None` for anything that does not match the canonical shape.
pub fn parse_image_id(stem: &str) -> Option<(u32, u32, u32)> {
    let mut parts = stem.split('_');
    let volume = parts.next()?.strip_prefix("vol")?.parse().ok()?;
    let page = parts.next()?.strip_prefix('p')?.parse().ok()?;
    let ordinal = parts.next()?.strip_prefix("img")?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((volume, page, ordinal))
}

/// Directory name for a volume inside the images root.
pub fn volume_dir_name(volume: u32) -> String {
    format!("vol{volume}")
}

/// Render a path with forward slashes regardless of platform.
///
/// Stored artifact paths must be portable across checkouts.
pub fn portable_path(path: &Path) -> String {
    let rendered = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        rendered.into_owned()
    } else {
        rendered.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// One extracted image, as listed in the manifest artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Canonical id, `vol{V}_p{PPP}_img{K}`; also the filename stem.
    pub id: String,
    /// Volume the image came from.
    pub volume: u32,
    /// 1-based page number within the volume.
    #[serde(rename = "pagina")]
    pub page: u32,
    /// Forward-slash relative path to the JPEG.
    #[serde(rename = "imagem")]
    pub path: String,
    /// Pixel width measured at extraction time, before normalization.
    /// Known only for freshly extracted records; rebuilds omit it.
    #[serde(
        rename = "largura",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub width: Option<u32>,
    /// Pixel height measured at extraction time, before normalization.
    #[serde(
        rename = "altura",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub height: Option<u32>,
}

impl ImageRecord {
    pub fn new(volume: u32, page: u32, ordinal: u32, path: String) -> Self {
        Self {
            id: format_image_id(volume, page, ordinal),
            volume,
            page,
            path,
            width: None,
            height: None,
        }
    }

    /// Attach extraction-time pixel dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// JPEG filename for this record, e.g. `vol1_p028_img3.jpg`.
    pub fn file_name(&self) -> String {
        format!("{}.jpg", self.id)
    }
}

/// One letter in the index artifact: an image plus everything inferred
/// from its recognized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterRecord {
    /// Same id as the backing `ImageRecord`.
    pub id: String,
    pub volume: u32,
    #[serde(rename = "pagina")]
    pub page: u32,
    /// Inferred publication year; `null` when no plausible year was found.
    #[serde(rename = "ano", default)]
    pub year: Option<u16>,
    /// Normalized `dd/mm/yyyy` publication date; `null` when unknown.
    #[serde(rename = "data_publicacao", default)]
    pub date_published: Option<String>,
    /// Forward-slash relative path to the JPEG.
    #[serde(rename = "imagem")]
    pub image_path: String,
    /// Trimmed OCR text; empty when recognition failed.
    #[serde(rename = "texto")]
    pub text: String,
    /// Subject labels; never empty, falls back to the taxonomy default.
    #[serde(rename = "assuntos")]
    pub subjects: Vec<String>,
}

/// Top-level shape of the letter index artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterIndex {
    pub cartas: Vec<LetterRecord>,
}

/// Seam between index building and the OCR backend.
///
/// Implementations recognize printed text in a single image file. Any
/// failure degrades to an empty string; a batch must never abort because
/// one image was unreadable.
pub trait TextRecognizer {
    fn recognize(&self, image_path: &Path) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn image_id_round_trips_through_format_and_parse() {
        let id = format_image_id(1, 28, 3);
        assert_eq!(id, "vol1_p028_img3");
        assert_eq!(parse_image_id(&id), Some((1, 28, 3)));
    }

    #[test]
    fn image_id_pads_pages_to_three_digits() {
        assert_eq!(format_image_id(2, 5, 1), "vol2_p005_img1");
        assert_eq!(format_image_id(2, 364, 12), "vol2_p364_img12");
    }

    #[test]
    fn parse_rejects_malformed_stems() {
        assert_eq!(parse_image_id("vol1_p028"), None);
        assert_eq!(parse_image_id("vol1_p028_img3_extra"), None);
        assert_eq!(parse_image_id("volx_p028_img3"), None);
        assert_eq!(parse_image_id("capa_frontal"), None);
        assert_eq!(parse_image_id(""), None);
    }

    #[test]
    fn portable_path_uses_forward_slashes() {
        let path = PathBuf::from("cartas").join("vol1").join("vol1_p001_img1.jpg");
        assert_eq!(portable_path(&path), "cartas/vol1/vol1_p001_img1.jpg");
    }

    #[test]
    fn manifest_record_serializes_portuguese_keys() {
        let record = ImageRecord::new(1, 28, 1, "cartas/vol1/vol1_p028_img1.jpg".into())
            .with_dimensions(800, 1200);
        let json = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(json["id"], "vol1_p028_img1");
        assert_eq!(json["pagina"], 28);
        assert_eq!(json["imagem"], "cartas/vol1/vol1_p028_img1.jpg");
        assert_eq!(json["largura"], 800);
        assert_eq!(json["altura"], 1200);
    }

    #[test]
    fn manifest_record_omits_unknown_dimensions() {
        let record = ImageRecord::new(2, 5, 2, "cartas/vol2/vol2_p005_img2.jpg".into());
        let json = serde_json::to_value(&record).expect("serialize record");
        assert!(json.get("largura").is_none());
        assert!(json.get("altura").is_none());
    }

    #[test]
    fn letter_record_serializes_null_for_unknown_year_and_date() {
        let letter = LetterRecord {
            id: "vol1_p010_img1".into(),
            volume: 1,
            page: 10,
            year: None,
            date_published: None,
            image_path: "cartas/vol1/vol1_p010_img1.jpg".into(),
            text: String::new(),
            subjects: vec!["General".into()],
        };
        let json = serde_json::to_value(&letter).expect("serialize letter");
        assert!(json["ano"].is_null());
        assert!(json["data_publicacao"].is_null());
        assert_eq!(json["assuntos"][0], "General");
    }

    #[test]
    fn letter_record_round_trips_through_json() {
        let letter = LetterRecord {
            id: "vol2_p100_img1".into(),
            volume: 2,
            page: 100,
            year: Some(2011),
            date_published: Some("07/04/2011".into()),
            image_path: "cartas/vol2/vol2_p100_img1.jpg".into(),
            text: "Querida amiga,\nescrevo de Porto Alegre.".into(),
            subjects: vec!["Família".into()],
        };
        let json = serde_json::to_string(&letter).expect("serialize letter");
        let back: LetterRecord = serde_json::from_str(&json).expect("deserialize letter");
        assert_eq!(back, letter);
    }
}
