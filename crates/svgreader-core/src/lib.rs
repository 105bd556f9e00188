#![forbid(unsafe_code)]

//! SVG geometry pipeline for cutting toolpaths.
//!
//! Turns an SVG element tree into flat polylines in millimeters, grouped by stroke color:
//! transforms are flattened, curves and arcs tessellated to a tolerance, basic shapes converted to
//! paths, and the result optionally simplified and reordered to shorten travel moves.
//!
//! XML parsing is left to the caller; see the `svgreader` crate for a ready-made front end.

pub mod assemble;
pub mod config;
pub mod error;
pub mod geom;
pub mod notify;
pub mod path;
pub mod shapes;
pub mod style;
pub mod tessellate;
pub mod transform_list;
pub mod tree;
pub mod units;
mod walker;

pub use assemble::{ParseOutput, Raster};
pub use config::ReaderConfig;
pub use error::{Error, Result};
pub use geom::{Point, Transform, Vector};
pub use notify::{Diagnostic, Diagnostics, Notifier, Severity, TracingNotifier};
pub use path::Subpath;
pub use tree::Element;
pub use walker::MAX_TREE_DEPTH;

use units::ToleranceProfile;
use walker::Walker;

/// Converts an element tree to color-grouped millimeter polylines.
///
/// `source` is the raw document text; its head is inspected for the generator application to pick
/// the px density. Element-level problems go to `notifier` and never abort the document; the only
/// fatal error is a page size in physical units.
pub fn parse(
    root: &Element,
    source: &str,
    config: &ReaderConfig,
    notifier: &mut dyn Notifier,
) -> Result<ParseOutput> {
    let dpi = units::resolve_dpi(config, source, root, notifier)?;
    let tolerances = ToleranceProfile::new(dpi, config.tolerance);
    tracing::debug!(dpi, tolerance = config.tolerance, optimize = config.optimize, "reading svg");

    let mut walker = Walker::new(tolerances, notifier);
    walker.walk(root);
    Ok(walker.finish(config.optimize))
}
