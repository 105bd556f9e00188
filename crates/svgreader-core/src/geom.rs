#![forbid(unsafe_code)]

//! Affine transform kernel.
//!
//! Transforms use the row-vector convention of SVG's `matrix(a b c d e f)`:
//! `[x' y'] = [x y] * [[a b] [c d]] + [e f]`, which is exactly euclid's `Transform2D` layout
//! (`m11 = a`, `m12 = b`, `m21 = c`, `m22 = d`, `m31 = e`, `m32 = f`).

pub type Unit = euclid::UnknownUnit;

pub type Point = euclid::Point2D<f64, Unit>;
pub type Vector = euclid::Vector2D<f64, Unit>;
pub type Transform = euclid::Transform2D<f64, Unit, Unit>;

pub fn point(x: f64, y: f64) -> Point {
    euclid::point2(x, y)
}

pub fn vector(x: f64, y: f64) -> Vector {
    euclid::vec2(x, y)
}

/// Builds a transform from the six SVG matrix scalars.
pub fn matrix(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Transform {
    Transform::new(a, b, c, d, e, f)
}

/// Returns `parent ∘ local`: the local transform is applied first, then the parent's.
pub fn compose(parent: &Transform, local: &Transform) -> Transform {
    local.then(parent)
}

pub fn apply(m: &Transform, p: Point) -> Point {
    m.transform_point(p)
}

/// Applies only the linear part of `m` (no translation). Used for sizes and extents.
pub fn apply_linear(m: &Transform, v: Vector) -> Vector {
    m.transform_vector(v)
}

/// Dominant axis scale of `m`; `0.0` for a singular matrix.
pub fn extract_scale(m: &Transform) -> f64 {
    let sx = m.m11.hypot(m.m12);
    let sy = m.m21.hypot(m.m22);
    let det = m.m11 * m.m22 - m.m12 * m.m21;
    if det == 0.0 || !det.is_finite() {
        return 0.0;
    }
    sx.max(sy)
}

pub fn distance_squared(a: Point, b: Point) -> f64 {
    (b - a).square_length()
}

pub fn midpoint(a: Point, b: Point) -> Point {
    a.lerp(b, 0.5)
}

pub fn is_finite(p: Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}
