use crate::config::MatcherConfig;
use crate::{AnchorBox, CitationMetadata, PageAnnotations, ReferenceEntry, TargetLocation};

/// Attaches bibliography metadata to every annotation whose link target is
/// spatially close to a known entry.
///
/// Matching is purely geometric: the closest entry anchor on the target's
/// page wins, provided it falls strictly inside the distance threshold. No
/// textual comparison of citation keys happens here; the key conventions of
/// the PDF and of the metadata extractor are independent.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMatcher {
    config: MatcherConfig,
}

impl ReferenceMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Enrich the extractor's output with bibliography metadata.
    ///
    /// Annotations without a resolved target pass through unchanged, so
    /// downstream consumers can tell "no hyperlink target" (`target: None`)
    /// apart from "searched, nothing within threshold" (`metadata: None`).
    pub fn match_references(
        &self,
        mut pages: Vec<PageAnnotations>,
        references: &[ReferenceEntry],
    ) -> Vec<PageAnnotations> {
        for page in &mut pages {
            for annotation in &mut page.annotations {
                let Some(target) = &annotation.target else {
                    continue;
                };
                annotation.metadata = self.best_match(target, references);
            }
        }
        pages
    }

    /// Linear scan over the reference list for the closest anchor on the
    /// target's page. Reference lists are a single paper's bibliography
    /// (tens to low hundreds of entries), so no spatial index is needed.
    fn best_match(
        &self,
        target: &TargetLocation,
        references: &[ReferenceEntry],
    ) -> Option<CitationMetadata> {
        let effective_y = if self.config.target_bottom_origin {
            1.0 - target.y
        } else {
            target.y
        };

        let mut best: Option<(f64, &ReferenceEntry, &AnchorBox)> = None;
        for entry in references {
            // Only the first anchor box is the entry's spatial anchor;
            // entries without one never participate.
            let Some(anchor) = entry.anchor_boxes.first() else {
                continue;
            };
            if anchor.page != target.page {
                continue;
            }
            let distance = distance(target.x, effective_y, anchor.left, anchor.top);
            if best.is_none_or(|(d, _, _)| distance < d) {
                best = Some((distance, entry, anchor));
            }
        }

        let (distance, entry, anchor) = best?;
        if distance >= self.config.distance_threshold {
            tracing::debug!(
                page = target.page,
                ref_id = %entry.id,
                distance,
                "closest bibliography anchor beyond threshold"
            );
            return None;
        }
        Some(CitationMetadata::from_entry(entry, anchor.clone()))
    }
}

fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (x1 - x2).hypot(y1 - y2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Annotation, NormalizedBox};

    fn entry(id: &str, anchors: Vec<AnchorBox>) -> ReferenceEntry {
        ReferenceEntry {
            id: id.to_string(),
            title: Some(format!("Title of {id}")),
            authors: vec!["A. Author".to_string()],
            year: Some(2020),
            venue: Some("Example Conference".to_string()),
            doi: None,
            arxiv_id: None,
            anchor_boxes: anchors,
        }
    }

    fn anchor(page: u32, left: f64, top: f64) -> AnchorBox {
        AnchorBox { page, left, top, width: 0.8, height: 0.02 }
    }

    fn page_with_target(target: TargetLocation) -> Vec<PageAnnotations> {
        vec![PageAnnotations {
            page: 1,
            annotations: vec![Annotation {
                destination: "cite.r1".to_string(),
                source_box: NormalizedBox { x1: 0.1, y1: 0.5, x2: 0.15, y2: 0.52 },
                target: Some(target),
                metadata: None,
            }],
        }]
    }

    #[test]
    fn test_match_within_threshold() {
        // effective_y = 1 - 0.30 = 0.70; anchor at (0.21, 0.695) is ~0.0112 away
        let matcher = ReferenceMatcher::new();
        let pages = page_with_target(TargetLocation { page: 5, x: 0.20, y: 0.30 });
        let refs = vec![entry("r1", vec![anchor(5, 0.21, 0.695)])];
        let matched = matcher.match_references(pages, &refs);
        let metadata = matched[0].annotations[0].metadata.as_ref().unwrap();
        assert_eq!(metadata.ref_id, "r1");
        assert_eq!(metadata.anchor, anchor(5, 0.21, 0.695));
        assert_eq!(metadata.year, Some(2020));
    }

    #[test]
    fn test_no_match_beyond_threshold() {
        let matcher = ReferenceMatcher::new();
        let pages = page_with_target(TargetLocation { page: 5, x: 0.20, y: 0.30 });
        let refs = vec![entry("r1", vec![anchor(5, 0.80, 0.10)])];
        let matched = matcher.match_references(pages, &refs);
        assert!(matched[0].annotations[0].metadata.is_none());
        // the annotation itself is untouched
        assert!(matched[0].annotations[0].target.is_some());
    }

    #[test]
    fn test_threshold_is_strict() {
        // anchor exactly distance_threshold away (0.125 is exact in binary):
        // the comparison is strict, so this must not match
        let matcher = ReferenceMatcher::with_config(
            MatcherConfig::new().with_distance_threshold(0.125),
        );
        let pages = page_with_target(TargetLocation { page: 1, x: 0.25, y: 0.50 });
        let refs = vec![entry("r1", vec![anchor(1, 0.375, 0.50)])];
        let matched = matcher.match_references(pages, &refs);
        assert!(matched[0].annotations[0].metadata.is_none());
    }

    #[test]
    fn test_page_mismatch_never_matches() {
        // same coordinates, different page
        let matcher = ReferenceMatcher::new();
        let pages = page_with_target(TargetLocation { page: 5, x: 0.20, y: 0.30 });
        let refs = vec![entry("r1", vec![anchor(6, 0.20, 0.70)])];
        let matched = matcher.match_references(pages, &refs);
        assert!(matched[0].annotations[0].metadata.is_none());
    }

    #[test]
    fn test_closest_entry_wins() {
        let matcher = ReferenceMatcher::new();
        let pages = page_with_target(TargetLocation { page: 5, x: 0.20, y: 0.30 });
        let refs = vec![
            entry("far", vec![anchor(5, 0.26, 0.70)]),
            entry("near", vec![anchor(5, 0.21, 0.695)]),
        ];
        let matched = matcher.match_references(pages, &refs);
        let metadata = matched[0].annotations[0].metadata.as_ref().unwrap();
        assert_eq!(metadata.ref_id, "near");
    }

    #[test]
    fn test_entries_without_anchors_are_skipped() {
        let matcher = ReferenceMatcher::new();
        let pages = page_with_target(TargetLocation { page: 5, x: 0.20, y: 0.30 });
        let refs = vec![entry("no-anchor", Vec::new())];
        let matched = matcher.match_references(pages, &refs);
        assert!(matched[0].annotations[0].metadata.is_none());
    }

    #[test]
    fn test_only_first_anchor_is_considered() {
        // second anchor would match, first is on the wrong page
        let matcher = ReferenceMatcher::new();
        let pages = page_with_target(TargetLocation { page: 5, x: 0.20, y: 0.30 });
        let refs = vec![entry("r1", vec![anchor(9, 0.21, 0.695), anchor(5, 0.21, 0.695)])];
        let matched = matcher.match_references(pages, &refs);
        assert!(matched[0].annotations[0].metadata.is_none());
    }

    #[test]
    fn test_annotation_without_target_passes_through() {
        let matcher = ReferenceMatcher::new();
        let pages = vec![PageAnnotations {
            page: 1,
            annotations: vec![Annotation {
                destination: "cite.r1".to_string(),
                source_box: NormalizedBox { x1: 0.1, y1: 0.5, x2: 0.15, y2: 0.52 },
                target: None,
                metadata: None,
            }],
        }];
        let refs = vec![entry("r1", vec![anchor(1, 0.1, 0.5)])];
        let matched = matcher.match_references(pages.clone(), &refs);
        assert_eq!(matched, pages);
    }

    #[test]
    fn test_top_origin_targets_skip_the_flip() {
        let matcher = ReferenceMatcher::with_config(
            MatcherConfig::new().with_target_bottom_origin(false),
        );
        // without the flip, y = 0.695 is already aligned with the anchor
        let pages = page_with_target(TargetLocation { page: 5, x: 0.20, y: 0.695 });
        let refs = vec![entry("r1", vec![anchor(5, 0.21, 0.695)])];
        let matched = matcher.match_references(pages, &refs);
        assert!(matched[0].annotations[0].metadata.is_some());
    }

    #[test]
    fn test_empty_reference_list() {
        let matcher = ReferenceMatcher::new();
        let pages = page_with_target(TargetLocation { page: 5, x: 0.20, y: 0.30 });
        let matched = matcher.match_references(pages, &[]);
        assert!(matched[0].annotations[0].metadata.is_none());
    }
}
