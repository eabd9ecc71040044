use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract links: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A hyperlink annotation as read from the PDF's native link table, before
/// any normalization.
///
/// Coordinates are in page points with the origin at the page's top-left,
/// following the page-rectangle convention of the PDF library.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLink {
    /// Source rectangle `(x0, y0, x1, y1)` on the page the link sits on.
    pub bounds: (f32, f32, f32, f32),
    /// Destination name, e.g. `cite.doe2020`. `None` for links without a
    /// named destination (external URLs resolve to `None` here as well).
    pub destination: Option<String>,
    /// 1-based destination page number, if the link resolves to one.
    pub target_page: Option<u32>,
    /// Destination point in the destination page's own point space.
    pub target_point: Option<(f32, f32)>,
}

/// One page of the document: its dimensions and its raw links.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPage {
    pub width: f32,
    pub height: f32,
    pub links: Vec<RawLink>,
}

/// Trait for PDF link-table backends.
///
/// Implementors provide the low-level page walk; geometry normalization,
/// filtering, and merging live in [`crate::extract::LinkExtractor`]. The
/// document handle must not outlive the call: it is opened inside
/// `load_pages` and released on every exit path, including errors raised
/// mid-iteration.
pub trait LinkBackend: Send + Sync {
    /// Read page dimensions and the raw link list for every page of the PDF.
    fn load_pages(&self, path: &Path) -> Result<Vec<RawPage>, BackendError>;
}
