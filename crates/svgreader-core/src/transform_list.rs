//! `transform` attribute parsing.
//!
//! A malformed primitive is dropped and reported; the remaining primitives still apply.

use crate::geom::{Transform, compose, matrix};
use regex::Regex;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("unknown transform '{name}' skipped")]
    Unknown { name: String },

    #[error("transform '{name}' skipped: contains non-numbers")]
    NonNumeric { name: String },

    #[error("transform '{name}' skipped: {count} parameters is not a valid arity")]
    Arity { name: String, count: usize },

    #[error("malformed transform text '{text}' skipped")]
    Malformed { text: String },
}

fn primitive_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Za-z]+)\s*\(([^)]*)\)").expect("valid regex"))
}

fn separator_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s,]+").expect("valid regex"))
}

/// Parses a transform list into one matrix. Primitives combine left to right, so the rightmost
/// one is applied to points first.
pub fn parse_transform_list(value: &str) -> (Transform, Vec<TransformError>) {
    let mut combined = Transform::identity();
    let mut errors = Vec::new();
    let mut consumed = 0;
    for caps in primitive_regex().captures_iter(value) {
        let whole = caps.get(0).map_or(consumed..consumed, |m| m.range());
        check_gap(&value[consumed..whole.start], &mut errors);
        consumed = whole.end;
        let name = &caps[1];
        match primitive(name, &caps[2]) {
            Ok(m) => combined = compose(&combined, &m),
            Err(e) => errors.push(e),
        }
    }
    check_gap(&value[consumed..], &mut errors);
    (combined, errors)
}

/// Text between primitives may only be separators.
fn check_gap(gap: &str, errors: &mut Vec<TransformError>) {
    let text = gap.trim_matches(|c: char| c.is_whitespace() || c == ',');
    if !text.is_empty() {
        errors.push(TransformError::Malformed {
            text: text.to_string(),
        });
    }
}

fn primitive(name: &str, params: &str) -> Result<Transform, TransformError> {
    let mut values = Vec::new();
    for raw in separator_regex().split(params.trim()) {
        if raw.is_empty() {
            continue;
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => values.push(v),
            _ => {
                return Err(TransformError::NonNumeric {
                    name: name.to_string(),
                });
            }
        }
    }
    let arity = || TransformError::Arity {
        name: name.to_string(),
        count: values.len(),
    };

    match name {
        "translate" => match values[..] {
            [tx] => Ok(matrix(1.0, 0.0, 0.0, 1.0, tx, 0.0)),
            [tx, ty] => Ok(matrix(1.0, 0.0, 0.0, 1.0, tx, ty)),
            _ => Err(arity()),
        },
        "rotate" => match values[..] {
            [deg] => Ok(rotation(deg)),
            [deg, cx, cy] => {
                let to_center = matrix(1.0, 0.0, 0.0, 1.0, cx, cy);
                let from_center = matrix(1.0, 0.0, 0.0, 1.0, -cx, -cy);
                Ok(compose(&compose(&to_center, &rotation(deg)), &from_center))
            }
            _ => Err(arity()),
        },
        "scale" => match values[..] {
            [s] => Ok(matrix(s, 0.0, 0.0, s, 0.0, 0.0)),
            [sx, sy] => Ok(matrix(sx, 0.0, 0.0, sy, 0.0, 0.0)),
            _ => Err(arity()),
        },
        "matrix" => match values[..] {
            [a, b, c, d, e, f] => Ok(matrix(a, b, c, d, e, f)),
            _ => Err(arity()),
        },
        "skewX" => match values[..] {
            [deg] => Ok(matrix(1.0, 0.0, deg.to_radians().tan(), 1.0, 0.0, 0.0)),
            _ => Err(arity()),
        },
        "skewY" => match values[..] {
            [deg] => Ok(matrix(1.0, deg.to_radians().tan(), 0.0, 1.0, 0.0, 0.0)),
            _ => Err(arity()),
        },
        _ => Err(TransformError::Unknown {
            name: name.to_string(),
        }),
    }
}

fn rotation(deg: f64) -> Transform {
    let (sin, cos) = deg.to_radians().sin_cos();
    matrix(cos, sin, -sin, cos, 0.0, 0.0)
}
