//! Basic shapes (<https://www.w3.org/TR/SVG11/shapes.html>), rewritten as path tokens so they share
//! the path interpreter's tessellation.

use crate::geom::{Point, Vector, point, vector};
use crate::path::{PathBuilder, PathToken};
use crate::tree::Element;
use crate::units::parse_length;

/// Bezier handle length for a quarter ellipse, as a fraction of the radius.
const KAPPA: f64 = 0.552_284_749_830_793_4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rect,
    Circle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
}

impl ShapeKind {
    pub fn tag(self) -> &'static str {
        match self {
            ShapeKind::Rect => "rect",
            ShapeKind::Circle => "circle",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Line => "line",
            ShapeKind::Polyline => "polyline",
            ShapeKind::Polygon => "polygon",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    #[error("odd number of vertex coordinates ({count})")]
    OddPointCount { tag: &'static str, count: usize },

    #[error("non-numeric vertex coordinate {value:?}")]
    InvalidPoints { tag: &'static str, value: String },
}

/// Path tokens for a shape element, or `None` when the shape has nothing to draw.
pub fn shape_path(kind: ShapeKind, el: &Element, dpi: f64) -> Result<Option<Vec<PathToken>>, ShapeError> {
    let len = |name: &str| el.attr(name).and_then(|v| parse_length(v, dpi));
    Ok(match kind {
        ShapeKind::Rect => rect(
            len("x").unwrap_or(0.0),
            len("y").unwrap_or(0.0),
            len("width").unwrap_or(0.0),
            len("height").unwrap_or(0.0),
            len("rx"),
            len("ry"),
        ),
        ShapeKind::Circle => {
            let r = len("r").unwrap_or(0.0);
            ellipse(len("cx").unwrap_or(0.0), len("cy").unwrap_or(0.0), r, r)
        }
        ShapeKind::Ellipse => ellipse(
            len("cx").unwrap_or(0.0),
            len("cy").unwrap_or(0.0),
            len("rx").unwrap_or(0.0),
            len("ry").unwrap_or(0.0),
        ),
        ShapeKind::Line => Some(
            PathBuilder::new()
                .push('M', &[len("x1").unwrap_or(0.0), len("y1").unwrap_or(0.0)])
                .push('L', &[len("x2").unwrap_or(0.0), len("y2").unwrap_or(0.0)])
                .build(),
        ),
        ShapeKind::Polyline => poly(kind.tag(), el.attr("points"), false)?,
        ShapeKind::Polygon => poly(kind.tag(), el.attr("points"), true)?,
    })
}

fn rect(x: f64, y: f64, w: f64, h: f64, rx: Option<f64>, ry: Option<f64>) -> Option<Vec<PathToken>> {
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    let rx = rx.or(ry).map_or(0.0, f64::abs).min(w / 2.0);
    let ry = ry.or(Some(rx)).map_or(0.0, f64::abs).min(h / 2.0);
    if rx <= 0.0 || ry <= 0.0 {
        return Some(
            PathBuilder::new()
                .push('M', &[x, y])
                .push('h', &[w])
                .push('v', &[h])
                .push('h', &[-w])
                .command('z')
                .build(),
        );
    }
    let (kx, ky) = (KAPPA * rx, KAPPA * ry);
    Some(
        PathBuilder::new()
            .push('M', &[x + rx, y])
            .push('h', &[w - 2.0 * rx])
            .push('c', &[kx, 0.0, rx, ry - ky, rx, ry])
            .push('v', &[h - 2.0 * ry])
            .push('c', &[0.0, ky, kx - rx, ry, -rx, ry])
            .push('h', &[-(w - 2.0 * rx)])
            .push('c', &[-kx, 0.0, -rx, ky - ry, -rx, -ry])
            .push('v', &[-(h - 2.0 * ry)])
            .push('c', &[0.0, -ky, rx - kx, -ry, rx, -ry])
            .command('z')
            .build(),
    )
}

fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Option<Vec<PathToken>> {
    if !(rx > 0.0 && ry > 0.0) {
        return None;
    }
    Some(
        PathBuilder::new()
            .push('M', &[cx - rx, cy])
            .push('A', &[rx, ry, 0.0, 0.0, 0.0, cx, cy + ry])
            .push('A', &[rx, ry, 0.0, 0.0, 0.0, cx + rx, cy])
            .push('A', &[rx, ry, 0.0, 0.0, 0.0, cx, cy - ry])
            .push('A', &[rx, ry, 0.0, 0.0, 0.0, cx - rx, cy])
            .command('Z')
            .build(),
    )
}

fn poly(tag: &'static str, points: Option<&str>, close: bool) -> Result<Option<Vec<PathToken>>, ShapeError> {
    let Some(points) = points else {
        return Ok(None);
    };
    let mut coords = Vec::new();
    for raw in points.split(|c: char| c == ',' || c.is_whitespace()) {
        if raw.is_empty() {
            continue;
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => coords.push(v),
            _ => {
                return Err(ShapeError::InvalidPoints {
                    tag,
                    value: raw.to_string(),
                });
            }
        }
    }
    if coords.len() % 2 != 0 {
        return Err(ShapeError::OddPointCount {
            tag,
            count: coords.len(),
        });
    }
    if coords.is_empty() {
        return Ok(None);
    }
    let mut builder = PathBuilder::new().push('M', &coords[..2]);
    if coords.len() > 2 {
        builder = builder.push('L', &coords[2..]);
    }
    if close {
        builder = builder.command('z');
    }
    Ok(Some(builder.build()))
}

/// Placement of an `<image>` in local px.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    pub position: Point,
    pub size: Vector,
    pub reference: String,
}

/// Reads an `<image>`'s box and link. Images without a link are skipped.
pub fn image_placement(el: &Element, dpi: f64) -> Option<ImagePlacement> {
    let reference = el.attr("href").or_else(|| el.attr("xlink:href"))?;
    let len = |name: &str| el.attr(name).and_then(|v| parse_length(v, dpi)).unwrap_or(0.0);
    Some(ImagePlacement {
        position: point(len("x"), len("y")),
        size: vector(len("width"), len("height")),
        reference: reference.to_string(),
    })
}
