use crate::CITE_PREFIX;

/// Tunables for the annotation extractor.
///
/// The merge tolerances are fractions of the page height/width, so they hold
/// across page sizes. Different PDF producers split citation markers into
/// glyph boxes at different granularity; both knobs are injectable rather
/// than constants for that reason.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Destination-name prefix that marks a link as a citation. Default `cite.`.
    pub destination_prefix: String,
    /// Two boxes count as the same text line when their top edges differ by
    /// less than this fraction of page height. Default 0.008.
    pub line_tolerance: f64,
    /// Maximum horizontal gap (fraction of page width) between two same-line
    /// boxes for them to merge. Negative gaps (overlap) always qualify.
    /// Default 0.05.
    pub horizontal_gap: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            destination_prefix: CITE_PREFIX.to_string(),
            line_tolerance: 0.008,
            horizontal_gap: 0.05,
        }
    }
}

impl ExtractorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_destination_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.destination_prefix = prefix.into();
        self
    }

    pub fn with_line_tolerance(mut self, tolerance: f64) -> Self {
        self.line_tolerance = tolerance;
        self
    }

    pub fn with_horizontal_gap(mut self, gap: f64) -> Self {
        self.horizontal_gap = gap;
        self
    }
}

/// Tunables for the annotation matcher.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Maximum Euclidean distance (in page-fraction space) at which a
    /// bibliography anchor is accepted. The comparison is strict. Default 0.1.
    pub distance_threshold: f64,
    /// Link-target points use a bottom-left origin while bibliography anchors
    /// use a top-left origin; when set, the target's y is flipped
    /// (`1 - y`) before the distance computation. The two conventions come
    /// from independent upstream producers, so this stays a flag rather than
    /// a hardcoded flip. Default `true`.
    pub target_bottom_origin: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 0.1,
            target_bottom_origin: true,
        }
    }
}

impl MatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_distance_threshold(mut self, threshold: f64) -> Self {
        self.distance_threshold = threshold;
        self
    }

    pub fn with_target_bottom_origin(mut self, flipped: bool) -> Self {
        self.target_bottom_origin = flipped;
        self
    }
}
