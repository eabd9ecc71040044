use std::collections::HashMap;
use std::path::Path;

use crate::backend::{LinkBackend, RawLink, RawPage};
use crate::config::ExtractorConfig;
use crate::{clamp_unit, Annotation, ExtractError, NormalizedBox, PageAnnotations, TargetLocation};

/// Walks the pages of a PDF and produces normalized citation-marker
/// annotations, with same-line fragments merged into single logical markers.
///
/// Hyperref splits a single `\cite{a,b}` marker into one link rectangle per
/// glyph run in some producer/viewer combinations; the merge step rejoins
/// boxes that share a destination, sit on the same text line, and are
/// horizontally adjacent.
#[derive(Debug, Clone, Default)]
pub struct LinkExtractor {
    config: ExtractorConfig,
}

impl LinkExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract all citation-marker annotations of the document, one
    /// [`PageAnnotations`] record per page that produced at least one marker.
    ///
    /// Opening failures propagate; individual malformed links are skipped.
    pub fn extract(
        &self,
        path: &Path,
        backend: &dyn LinkBackend,
    ) -> Result<Vec<PageAnnotations>, ExtractError> {
        let raw_pages = backend.load_pages(path)?;
        Ok(self.extract_from_pages(&raw_pages))
    }

    /// Same as [`extract`](Self::extract), operating on already-loaded pages.
    pub fn extract_from_pages(&self, raw_pages: &[RawPage]) -> Vec<PageAnnotations> {
        let mut result = Vec::new();
        for (idx, raw) in raw_pages.iter().enumerate() {
            let page = idx as u32 + 1;
            let annotations = self.page_annotations(page, raw, raw_pages);
            if annotations.is_empty() {
                continue;
            }
            result.push(PageAnnotations {
                page,
                annotations: self.merge_annotations(annotations),
            });
        }
        result
    }

    /// Collect the raw citation links of one page as normalized annotations.
    fn page_annotations(&self, page: u32, raw: &RawPage, all: &[RawPage]) -> Vec<Annotation> {
        if raw.width <= 0.0 || raw.height <= 0.0 {
            tracing::debug!(page, "skipping page with degenerate dimensions");
            return Vec::new();
        }

        let mut annotations = Vec::new();
        for link in &raw.links {
            let Some(destination) = link.destination.as_deref() else {
                continue;
            };
            if !destination.starts_with(&self.config.destination_prefix) {
                continue;
            }
            let (x0, y0, x1, y1) = link.bounds;
            if x1 <= x0 || y1 <= y0 {
                tracing::debug!(page, dest = destination, "skipping link with degenerate rect");
                continue;
            }
            annotations.push(Annotation {
                destination: destination.to_string(),
                source_box: NormalizedBox::from_page_rect(x0, y0, x1, y1, raw.width, raw.height),
                target: resolve_target(page, link, all),
                metadata: None,
            });
        }
        annotations
    }

    /// Merge same-line, horizontally adjacent boxes that share a destination.
    ///
    /// Per destination group, boxes are sorted by `(y1, x1)` (reading order)
    /// and swept once; an accumulator absorbs the next box whenever the top
    /// edges are within `line_tolerance` and the horizontal gap is below
    /// `horizontal_gap`. The union only ever widens, so final bounds do not
    /// depend on which adjacent pair merges first. Group order follows first
    /// appearance on the page, keeping output reproducible.
    fn merge_annotations(&self, annotations: Vec<Annotation>) -> Vec<Annotation> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<Annotation>> = HashMap::new();
        for ann in annotations {
            if !groups.contains_key(&ann.destination) {
                order.push(ann.destination.clone());
            }
            groups.entry(ann.destination.clone()).or_default().push(ann);
        }

        let mut merged = Vec::new();
        for destination in order {
            let Some(mut group) = groups.remove(&destination) else {
                continue;
            };
            group.sort_by(|a, b| {
                a.source_box
                    .y1
                    .total_cmp(&b.source_box.y1)
                    .then(a.source_box.x1.total_cmp(&b.source_box.x1))
            });

            let mut iter = group.into_iter();
            let Some(mut current) = iter.next() else {
                continue;
            };
            for next in iter {
                let same_line =
                    (current.source_box.y1 - next.source_box.y1).abs() < self.config.line_tolerance;
                let adjacent =
                    next.source_box.x1 - current.source_box.x2 < self.config.horizontal_gap;
                if same_line && adjacent {
                    // Union of the source boxes only; the first fragment's
                    // target and destination are retained.
                    current.source_box = current.source_box.union(&next.source_box);
                } else {
                    merged.push(current);
                    current = next;
                }
            }
            merged.push(current);
        }
        merged
    }
}

/// Resolve a link's destination point against the destination page's own
/// dimensions (which may differ from the source page's).
///
/// Links without a destination page/point stay in the output with no target;
/// a target pointing at a page the document does not have is malformed and
/// also resolves to `None`.
fn resolve_target(source_page: u32, link: &RawLink, all: &[RawPage]) -> Option<TargetLocation> {
    let page = link.target_page?;
    let (x, y) = link.target_point?;
    let Some(dest) = page.checked_sub(1).and_then(|i| all.get(i as usize)) else {
        tracing::debug!(page = source_page, target_page = page, "link target page out of range");
        return None;
    };
    if dest.width <= 0.0 || dest.height <= 0.0 {
        tracing::debug!(page = source_page, target_page = page, "link target page has degenerate dimensions");
        return None;
    }
    Some(TargetLocation {
        page,
        x: clamp_unit(f64::from(x) / f64::from(dest.width)),
        y: clamp_unit(f64::from(y) / f64::from(dest.height)),
    })
}
