use std::borrow::Cow;
use std::path::Path;

use mupdf::{DestinationKind, Document};
use percent_encoding::percent_decode_str;

use refmark_core::{BackendError, LinkBackend, RawLink, RawPage};

/// MuPDF-based implementation of [`LinkBackend`].
///
/// This crate is the sole AGPL island — it isolates the mupdf dependency
/// (which is AGPL-3.0) so that the geometric core does not transitively
/// depend on it.
///
/// The document handle lives entirely inside [`load_pages`]: it is dropped
/// on every exit path, including errors raised mid-iteration, so no native
/// resource can leak past the call.
///
/// [`load_pages`]: LinkBackend::load_pages
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl LinkBackend for MupdfBackend {
    fn load_pages(&self, path: &Path) -> Result<Vec<RawPage>, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut pages = Vec::new();

        for page_result in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let bounds = page
                .bounds()
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            let mut links = Vec::new();
            for link in page
                .links()
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?
            {
                // Resolve the destination first: named destinations that the
                // link table left unresolved go through Document::resolve_link.
                let resolved;
                let dest = match &link.dest {
                    Some(dest) => Some(dest),
                    None => {
                        resolved = document.resolve_link(&link.uri).ok().flatten();
                        resolved.as_ref()
                    }
                };

                let (target_page, target_point) = match dest {
                    Some(dest) => (
                        Some(dest.loc.page_number as u32 + 1),
                        destination_point(&dest.kind),
                    ),
                    None => (None, None),
                };

                links.push(RawLink {
                    bounds: (
                        link.bounds.x0 - bounds.x0,
                        link.bounds.y0 - bounds.y0,
                        link.bounds.x1 - bounds.x0,
                        link.bounds.y1 - bounds.y0,
                    ),
                    destination: destination_name(&link.uri).map(Cow::into_owned),
                    target_page,
                    target_point,
                });
            }

            pages.push(RawPage {
                width: bounds.x1 - bounds.x0,
                height: bounds.y1 - bounds.y0,
                links,
            });
        }

        Ok(pages)
    }
}

/// Extract the named-destination name from a link URI.
///
/// MuPDF reports internal links as URI fragments: `#nameddest=cite.doe2020`
/// for named destinations (percent-encoded), `#page=12&view=...` for
/// explicit ones. Only named destinations carry a name; external URLs and
/// explicit destinations yield `None`.
fn destination_name(uri: &str) -> Option<Cow<'_, str>> {
    let fragment = uri.strip_prefix('#')?;
    let name = match fragment.strip_prefix("nameddest=") {
        Some(name) => name,
        // A bare fragment without key=value pairs is also a destination name.
        None if !fragment.contains('=') && !fragment.is_empty() => fragment,
        None => return None,
    };
    percent_decode_str(name).decode_utf8().ok()
}

/// Pull the destination point out of a destination kind, when it has one.
///
/// Only `XYZ` destinations specify a full point; hyperref emits `XYZ` for
/// `cite.*` anchors, so fit-style destinations (no usable point) are left
/// unresolved rather than guessed at.
fn destination_point(kind: &DestinationKind) -> Option<(f32, f32)> {
    match kind {
        DestinationKind::XYZ { left, top, .. } => Some(((*left)?, (*top)?)),
        _ => None,
    }
}
