//! Unit and pixel-density resolution.
//!
//! SVG user units ("px") carry an implied density that depends on the exporting application:
//! Inkscape writes 90 dpi, Illustrator and Intaglio 72 dpi, CorelDraw 96 dpi. The density decides
//! how user units map to millimeters.

use crate::config::ReaderConfig;
use crate::notify::{Notifier, Severity};
use crate::tree::Element;
use crate::{Error, Result};
use std::str::FromStr;
use svgtypes::{Length, LengthUnit, ViewBox};

pub const DEFAULT_DPI: f64 = 90.0;
pub const MM_PER_INCH: f64 = 25.4;

/// How much of the raw document is inspected for generator signatures.
const SNIFF_CHARS: usize = 400;

/// First match wins.
const GENERATOR_DPI: &[(&str, &str, f64)] = &[
    ("inkscape", "Inkscape", 90.0),
    ("illustrator", "Illustrator", 72.0),
    ("intaglio", "Intaglio", 72.0),
    ("coreldraw", "CorelDraw", 96.0),
    ("qt", "Qt lib", 90.0),
];

/// Looks for a known generator application in the head of the raw document.
pub fn sniff_generator(source: &str) -> Option<(&'static str, f64)> {
    let head: String = source.chars().take(SNIFF_CHARS).collect::<String>().to_lowercase();
    GENERATOR_DPI
        .iter()
        .find(|(needle, _, _)| head.contains(needle))
        .map(|&(_, name, dpi)| (name, dpi))
}

/// Resolves the document density: explicit override, generator sniffing, page size, default.
pub fn resolve_dpi(
    config: &ReaderConfig,
    source: &str,
    root: &Element,
    notifier: &mut dyn Notifier,
) -> Result<f64> {
    if let Some(dpi) = config.dpi_override() {
        notifier.notify(Severity::Notice, &format!("SVG import forced to {dpi}dpi."));
        return Ok(dpi);
    }
    if let Some((app, dpi)) = sniff_generator(source) {
        notifier.notify(
            Severity::Notice,
            &format!("SVG exported with {app} -> {dpi}dpi."),
        );
        return Ok(dpi);
    }
    if let Some(dpi) = dpi_from_page_size(root, config.target_size[0])? {
        notifier.notify(
            Severity::Notice,
            &format!("Unit conversion from page size: {dpi:.0}dpi"),
        );
        return Ok(dpi);
    }
    notifier.notify(
        Severity::Warning,
        "Cannot parse page size -> defaulting to 90dpi.",
    );
    Ok(DEFAULT_DPI)
}

/// Derives the density that maps the root's page width onto `target_width_mm`.
///
/// Page sizes in physical units are rejected; relative units are treated as missing.
pub fn dpi_from_page_size(root: &Element, target_width_mm: f64) -> Result<Option<f64>> {
    if root.tag != "svg" {
        return Ok(None);
    }
    let width = match (page_length(root, "width")?, page_length(root, "height")?) {
        (Some(w), Some(_)) => Some(w),
        _ => root
            .attr("viewBox")
            .and_then(|vb| ViewBox::from_str(vb).ok())
            .map(|vb| vb.w),
    };
    let Some(width) = width else {
        return Ok(None);
    };
    let dpi = (MM_PER_INCH * width / target_width_mm).round();
    Ok((dpi.is_finite() && dpi > 0.0).then_some(dpi))
}

fn page_length(root: &Element, name: &str) -> Result<Option<f64>> {
    let Some(raw) = root.attr(name) else {
        return Ok(None);
    };
    let Ok(len) = Length::from_str(raw.trim()) else {
        return Ok(None);
    };
    let unit = match len.unit {
        LengthUnit::None | LengthUnit::Px => return Ok(Some(len.number)),
        LengthUnit::Cm => "cm",
        LengthUnit::Mm => "mm",
        LengthUnit::Pt => "pt",
        LengthUnit::Pc => "pc",
        LengthUnit::In => "in",
        _ => return Ok(None),
    };
    Err(Error::UnsupportedRootUnit {
        unit: unit.to_string(),
    })
}

/// Converts a length attribute to px at `dpi`. Relative units (`%`, `em`, `ex`) and unparsable
/// values yield `None`.
pub fn parse_length(value: &str, dpi: f64) -> Option<f64> {
    let len = Length::from_str(value.trim()).ok()?;
    let multiplier = match len.unit {
        LengthUnit::None | LengthUnit::Px => 1.0,
        LengthUnit::In => dpi,
        LengthUnit::Cm => dpi / 2.54,
        LengthUnit::Mm => dpi / MM_PER_INCH,
        LengthUnit::Pt => dpi / 72.0,
        LengthUnit::Pc => dpi / 6.0,
        _ => return None,
    };
    Some(multiplier * len.number).filter(|v| v.is_finite())
}

/// Tolerances derived once per document from the density and the configured mm tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceProfile {
    pub dpi: f64,
    pub tol_mm: f64,
    /// `tol²`, mm².
    pub tol2_mm: f64,
    /// Tolerance expressed in document px, squared. Used for tessellation.
    pub tol2_px: f64,
    /// `(tol / 2)²`, mm². Used for simplification.
    pub tol2_half: f64,
    /// `(tol / 10)²`, mm². Endpoint join distance.
    pub epsilon2: f64,
}

impl ToleranceProfile {
    pub fn new(dpi: f64, tol_mm: f64) -> Self {
        let mm2px = dpi / MM_PER_INCH;
        let epsilon = 0.1 * tol_mm;
        Self {
            dpi,
            tol_mm,
            tol2_mm: tol_mm * tol_mm,
            tol2_px: (mm2px * tol_mm).powi(2),
            tol2_half: (0.5 * tol_mm).powi(2),
            epsilon2: epsilon * epsilon,
        }
    }

    /// Factor converting document px to mm.
    pub fn px_to_mm(&self) -> f64 {
        MM_PER_INCH / self.dpi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Diagnostics;

    fn svg_root(attrs: &[(&str, &str)]) -> Element {
        attrs
            .iter()
            .fold(Element::new("svg"), |el, (k, v)| el.with_attr(*k, *v))
    }

    #[test]
    fn sniffs_generators_case_insensitively() {
        assert_eq!(
            sniff_generator("<!-- Created with INKSCAPE (http://www.inkscape.org/) -->"),
            Some(("Inkscape", 90.0))
        );
        assert_eq!(
            sniff_generator("<!-- Generator: Adobe Illustrator 15.0.0 -->"),
            Some(("Illustrator", 72.0))
        );
        assert_eq!(sniff_generator("<svg>CorelDRAW</svg>"), Some(("CorelDraw", 96.0)));
        assert_eq!(sniff_generator("<svg xmlns='http://www.w3.org/2000/svg'/>"), None);
    }

    #[test]
    fn sniffing_only_looks_at_the_document_head() {
        let doc = format!("<svg>{}Inkscape</svg>", " ".repeat(500));
        assert_eq!(sniff_generator(&doc), None);
    }

    #[test]
    fn override_wins_over_sniffing() {
        let mut notes = Diagnostics::new();
        let cfg = ReaderConfig::default().with_dpi(300.0);
        let dpi = resolve_dpi(&cfg, "Inkscape", &svg_root(&[]), &mut notes).unwrap();
        assert_eq!(dpi, 300.0);
        assert_eq!(notes.messages[0].message, "SVG import forced to 300dpi.");
    }

    #[test]
    fn derives_dpi_from_page_width() {
        let root = svg_root(&[("width", "4323.3"), ("height", "2161.6")]);
        assert_eq!(dpi_from_page_size(&root, 1220.0).unwrap(), Some(90.0));
        let root = svg_root(&[("width", "3458.3px"), ("height", "1729px")]);
        assert_eq!(dpi_from_page_size(&root, 1220.0).unwrap(), Some(72.0));
    }

    #[test]
    fn falls_back_to_view_box() {
        let root = svg_root(&[("viewBox", "0 0 4323.3 2161.6")]);
        assert_eq!(dpi_from_page_size(&root, 1220.0).unwrap(), Some(90.0));
        let root = svg_root(&[("width", "100%"), ("height", "100%"), ("viewBox", "0,0,4323.3,2161.6")]);
        assert_eq!(dpi_from_page_size(&root, 1220.0).unwrap(), Some(90.0));
    }

    #[test]
    fn physical_page_units_are_fatal() {
        let root = svg_root(&[("width", "210mm"), ("height", "297mm")]);
        let err = dpi_from_page_size(&root, 1220.0).unwrap_err();
        assert_eq!(err.to_string(), "Not supported: Page size in 'mm'.");
    }

    #[test]
    fn unresolvable_page_size_defaults_to_90_with_warning() {
        let mut notes = Diagnostics::new();
        let dpi = resolve_dpi(&ReaderConfig::default(), "<svg/>", &svg_root(&[]), &mut notes).unwrap();
        assert_eq!(dpi, DEFAULT_DPI);
        assert_eq!(notes.messages[0].severity, Severity::Warning);
    }

    #[test]
    fn parses_lengths_with_units() {
        assert_eq!(parse_length("10", 90.0), Some(10.0));
        assert_eq!(parse_length("10px", 90.0), Some(10.0));
        assert_eq!(parse_length("1in", 90.0), Some(90.0));
        assert!((parse_length("25.4mm", 90.0).unwrap() - 90.0).abs() < 1e-9);
        assert!((parse_length("2.54cm", 72.0).unwrap() - 72.0).abs() < 1e-9);
        assert!((parse_length("72pt", 90.0).unwrap() - 90.0).abs() < 1e-9);
        assert!((parse_length("6pc", 96.0).unwrap() - 96.0).abs() < 1e-9);
        assert_eq!(parse_length("50%", 90.0), None);
        assert_eq!(parse_length("2em", 90.0), None);
        assert_eq!(parse_length("wide", 90.0), None);
    }

    #[test]
    fn tolerance_profile_formulas() {
        let t = ToleranceProfile::new(90.0, 0.1);
        let mm2px: f64 = 90.0 / 25.4;
        assert!((t.tol2_px - (mm2px * 0.1).powi(2)).abs() < 1e-12);
        assert!((t.tol2_half - 0.0025).abs() < 1e-15);
        assert!((t.epsilon2 - 0.0001).abs() < 1e-15);
        assert!((t.tol2_mm - 0.01).abs() < 1e-15);
        assert!((t.px_to_mm() - 25.4 / 90.0).abs() < 1e-15);
    }
}
