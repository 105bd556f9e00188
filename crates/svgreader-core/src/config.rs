use serde::{Deserialize, Serialize};

pub const DEFAULT_TARGET_SIZE: [f64; 2] = [1220.0, 610.0];
pub const DEFAULT_TOLERANCE_MM: f64 = 0.1;

/// Reader options.
///
/// Deserializes from the same option object hosts already send, e.g.
/// `{"optimize": false, "dpi": 72, "target_size": [600, 400]}`; missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Simplify and reorder subpaths after traversal.
    pub optimize: bool,
    /// Forces the px density instead of sniffing or deriving it.
    pub dpi: Option<f64>,
    /// Physical size, in mm, the document's page size maps to.
    pub target_size: [f64; 2],
    /// Maximum geometric deviation, in mm, for tessellation and simplification.
    pub tolerance: f64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            optimize: true,
            dpi: None,
            target_size: DEFAULT_TARGET_SIZE,
            tolerance: DEFAULT_TOLERANCE_MM,
        }
    }
}

impl ReaderConfig {
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.dpi = Some(dpi);
        self
    }

    pub fn with_target_size(mut self, width_mm: f64, height_mm: f64) -> Self {
        self.target_size = [width_mm, height_mm];
        self
    }

    pub fn with_tolerance(mut self, tolerance_mm: f64) -> Self {
        self.tolerance = tolerance_mm;
        self
    }

    /// The forced density, if it is usable.
    pub(crate) fn dpi_override(&self) -> Option<f64> {
        self.dpi.filter(|dpi| dpi.is_finite() && *dpi > 0.0)
    }
}
