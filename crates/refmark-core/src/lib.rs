use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod backend;
pub mod config;
pub mod extract;
pub mod matching;

// Re-export for convenience
pub use backend::{BackendError, LinkBackend, RawLink, RawPage};
pub use config::{ExtractorConfig, MatcherConfig};
pub use extract::LinkExtractor;
pub use matching::ReferenceMatcher;

/// Destination-name prefix that marks a hyperlink as a citation marker.
///
/// LaTeX's hyperref package names every `\cite` anchor `cite.<key>`; links
/// with any other destination (section links, URLs, TOC entries) are not
/// citations and are filtered out during extraction.
pub const CITE_PREFIX: &str = "cite.";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to open PDF: {0}")]
    Open(String),
    #[error("failed to read page links: {0}")]
    Extraction(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BackendError> for ExtractError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::OpenError(msg) => ExtractError::Open(msg),
            BackendError::ExtractionError(msg) => ExtractError::Extraction(msg),
            BackendError::Io(e) => ExtractError::Io(e),
        }
    }
}

/// A rectangle in page-fraction coordinates, origin at the page's top-left.
///
/// Each field is the corresponding page-point coordinate divided by the page
/// width (x axis) or height (y axis), so boxes from pages of different
/// physical sizes are comparable. All fields lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl NormalizedBox {
    /// Normalize a rectangle given in page points against the page dimensions.
    ///
    /// Coordinates are clamped into `[0, 1]`; link rectangles occasionally
    /// overhang the page box by a point or two in real-world PDFs.
    pub fn from_page_rect(x0: f32, y0: f32, x1: f32, y1: f32, width: f32, height: f32) -> Self {
        Self {
            x1: clamp_unit(f64::from(x0) / f64::from(width)),
            y1: clamp_unit(f64::from(y0) / f64::from(height)),
            x2: clamp_unit(f64::from(x1) / f64::from(width)),
            y2: clamp_unit(f64::from(y1) / f64::from(height)),
        }
    }

    /// Bounding union of two boxes.
    pub fn union(&self, other: &NormalizedBox) -> NormalizedBox {
        NormalizedBox {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }
}

/// A resolved link target: a point on a destination page, normalized by that
/// page's own dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetLocation {
    /// 1-based page number.
    pub page: u32,
    pub x: f64,
    pub y: f64,
}

/// A citation-marker annotation found on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Destination name of the hyperlink, e.g. `cite.doe2020`.
    pub destination: String,
    /// Where the marker sits on its source page.
    pub source_box: NormalizedBox,
    /// Where the link points, if the PDF carries a resolvable destination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetLocation>,
    /// Bibliography metadata attached by the matcher, if a match was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CitationMetadata>,
}

/// All citation-marker annotations of a single page.
///
/// Pages without any citation markers are not represented at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAnnotations {
    /// 1-based page number.
    pub page: u32,
    pub annotations: Vec<Annotation>,
}

/// Bounding box marking where a bibliography entry's text begins, in the same
/// page-fraction convention as [`NormalizedBox`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorBox {
    /// 1-based page number.
    pub page: u32,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// A bibliography entry as produced by the upstream metadata extractor.
///
/// Only the first anchor box is used as the entry's spatial anchor; entries
/// with no anchor boxes never participate in matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arxiv_id: Option<String>,
    #[serde(default)]
    pub anchor_boxes: Vec<AnchorBox>,
}

/// Bibliography metadata attached to a matched annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationMetadata {
    pub ref_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arxiv_id: Option<String>,
    /// The anchor box the match was made against, kept for rendering and
    /// debugging downstream.
    pub anchor: AnchorBox,
}

impl CitationMetadata {
    pub fn from_entry(entry: &ReferenceEntry, anchor: AnchorBox) -> Self {
        Self {
            ref_id: entry.id.clone(),
            title: entry.title.clone(),
            authors: entry.authors.clone(),
            year: entry.year,
            venue: entry.venue.clone(),
            doi: entry.doi.clone(),
            arxiv_id: entry.arxiv_id.clone(),
            anchor,
        }
    }
}

pub(crate) fn clamp_unit(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_page_rect_normalizes() {
        let b = NormalizedBox::from_page_rect(61.2, 396.0, 85.68, 411.84, 612.0, 792.0);
        assert!((b.x1 - 0.1).abs() < 1e-6);
        assert!((b.y1 - 0.5).abs() < 1e-6);
        assert!((b.x2 - 0.14).abs() < 1e-6);
        assert!((b.y2 - 0.52).abs() < 1e-6);
    }

    #[test]
    fn test_from_page_rect_clamps_overhang() {
        let b = NormalizedBox::from_page_rect(-2.0, 0.0, 620.0, 793.0, 612.0, 792.0);
        assert_eq!(b.x1, 0.0);
        assert_eq!(b.x2, 1.0);
        assert_eq!(b.y2, 1.0);
    }

    #[test]
    fn test_union_widens_monotonically() {
        let a = NormalizedBox { x1: 0.10, y1: 0.50, x2: 0.14, y2: 0.52 };
        let b = NormalizedBox { x1: 0.15, y1: 0.505, x2: 0.19, y2: 0.525 };
        let u = a.union(&b);
        assert_eq!(u, NormalizedBox { x1: 0.10, y1: 0.50, x2: 0.19, y2: 0.525 });
        // commutative
        assert_eq!(b.union(&a), u);
    }

    #[test]
    fn test_annotation_serializes_without_absent_fields() {
        let ann = Annotation {
            destination: "cite.doe2020".to_string(),
            source_box: NormalizedBox { x1: 0.1, y1: 0.5, x2: 0.14, y2: 0.52 },
            target: None,
            metadata: None,
        };
        let json = serde_json::to_value(&ann).unwrap();
        assert!(json.get("target").is_none());
        assert!(json.get("metadata").is_none());
        assert_eq!(json["destination"], "cite.doe2020");
    }

    #[test]
    fn test_reference_entry_deserializes_minimal() {
        let entry: ReferenceEntry = serde_json::from_str(r#"{"id": "r3"}"#).unwrap();
        assert_eq!(entry.id, "r3");
        assert!(entry.anchor_boxes.is_empty());
        assert!(entry.title.is_none());
    }
}
