#![forbid(unsafe_code)]

//! `svgreader` reads SVG documents into flat polylines for laser cutters and CNC machines.
//!
//! Output coordinates are millimeters, grouped by stroke color (`"#rrggbb"`). The px density is
//! taken from [`ReaderConfig::dpi`], guessed from the generator application, or derived from the
//! page size mapped onto [`ReaderConfig::target_size`].
//!
//! ```no_run
//! let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="4323.3" height="2161.6">
//!   <rect x="10" y="10" width="100" height="50" stroke="red"/>
//! </svg>"#;
//! let output = svgreader::read_svg(svg, &svgreader::ReaderConfig::default())?;
//! for (color, polylines) in &output.boundaries {
//!     println!("{color}: {} polylines", polylines.len());
//! }
//! # Ok::<(), svgreader::Error>(())
//! ```

pub mod dom;

pub use svgreader_core::{
    Diagnostic, Diagnostics, Element, Notifier, ParseOutput, Point, Raster, ReaderConfig, Severity,
    Subpath, TracingNotifier, Vector,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid SVG markup: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error(transparent)]
    Core(#[from] svgreader_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reads `svg`, reporting notices, warnings and element errors through `tracing`.
pub fn read_svg(svg: &str, config: &ReaderConfig) -> Result<ParseOutput> {
    read_svg_with_notifier(svg, config, &mut TracingNotifier)
}

/// Reads `svg`, reporting notices, warnings and element errors to `notifier`.
pub fn read_svg_with_notifier(
    svg: &str,
    config: &ReaderConfig,
    notifier: &mut dyn Notifier,
) -> Result<ParseOutput> {
    let root = dom::element_tree(svg)?;
    tracing::trace!(root = %root.tag, children = root.children.len(), "parsed markup");
    Ok(svgreader_core::parse(&root, svg, config, notifier)?)
}
