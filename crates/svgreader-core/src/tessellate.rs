//! Adaptive curve flattening.
//!
//! All three flatteners append only the *interior* vertices of a segment to `out`; the caller owns
//! the segment's start and end points. Recursion is capped at [`MAX_DEPTH`] levels (at most 2^18
//! segments per curve); past the cap a curve is left under-tessellated rather than failing.
//!
//! The cubic flatness test follows the adaptive subdivision scheme described at
//! <http://www.antigrain.com/research/adaptive_bezier/index.html>, with the factor 5.0 that makes
//! Bezier density match the arc tessellation below.

use crate::geom::{Point, distance_squared, midpoint, point};
use std::f64::consts::PI;

pub const MAX_DEPTH: u32 = 18;

const FLATNESS_FACTOR: f64 = 5.0;

/// Flattens the cubic Bezier `p1 p2 p3 p4` by de Casteljau midpoint subdivision.
pub fn cubic_bezier(out: &mut Vec<Point>, p1: Point, p2: Point, p3: Point, p4: Point, tolerance2: f64) {
    cubic_level(out, p1, p2, p3, p4, 0, tolerance2);
}

fn cubic_level(
    out: &mut Vec<Point>,
    p1: Point,
    p2: Point,
    p3: Point,
    p4: Point,
    level: u32,
    tolerance2: f64,
) {
    if level > MAX_DEPTH {
        return;
    }

    let p12 = midpoint(p1, p2);
    let p23 = midpoint(p2, p3);
    let p34 = midpoint(p3, p4);
    let p123 = midpoint(p12, p23);
    let p234 = midpoint(p23, p34);
    let p1234 = midpoint(p123, p234);

    let chord = p4 - p1;
    let d2 = ((p2.x - p4.x) * chord.y - (p2.y - p4.y) * chord.x).abs();
    let d3 = ((p3.x - p4.x) * chord.y - (p3.y - p4.y) * chord.x).abs();

    let chord2 = chord.square_length();
    let flat = if chord2 == 0.0 {
        distance_squared(p1, p2).max(distance_squared(p1, p3)) <= tolerance2
    } else {
        (d2 + d3).powi(2) < FLATNESS_FACTOR * tolerance2 * chord2
    };
    if flat {
        out.push(p1234);
        return;
    }

    cubic_level(out, p1, p12, p123, p1234, level + 1, tolerance2);
    cubic_level(out, p1234, p234, p34, p4, level + 1, tolerance2);
}

/// Flattens the quadratic Bezier `p1 p2 p3`.
pub fn quadratic_bezier(out: &mut Vec<Point>, p1: Point, p2: Point, p3: Point, tolerance2: f64) {
    quadratic_level(out, p1, p2, p3, 0, tolerance2);
}

fn quadratic_level(out: &mut Vec<Point>, p1: Point, p2: Point, p3: Point, level: u32, tolerance2: f64) {
    if level > MAX_DEPTH {
        return;
    }

    let p12 = midpoint(p1, p2);
    let p23 = midpoint(p2, p3);
    let p123 = midpoint(p12, p23);

    let chord = p3 - p1;
    let d = ((p2.x - p3.x) * chord.y - (p2.y - p3.y) * chord.x).abs();

    let chord2 = chord.square_length();
    let flat = if chord2 == 0.0 {
        distance_squared(p1, p2) <= tolerance2
    } else {
        d * d <= FLATNESS_FACTOR * tolerance2 * chord2
    };
    if flat {
        out.push(p123);
        return;
    }

    quadratic_level(out, p1, p12, p123, level + 1, tolerance2);
    quadratic_level(out, p123, p23, p3, level + 1, tolerance2);
}

/// Endpoint parameterization of an SVG elliptical arc segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSegment {
    pub from: Point,
    pub rx: f64,
    pub ry: f64,
    /// Rotation of the ellipse's x axis, in degrees.
    pub x_axis_rotation: f64,
    pub large_arc: bool,
    pub sweep: bool,
    pub to: Point,
}

/// Center parameterization, see <https://www.w3.org/TR/SVG/implnote.html#ArcImplementationNotes>.
#[derive(Debug, Clone, Copy)]
struct ArcCenter {
    center: Point,
    rx: f64,
    ry: f64,
    cos_phi: f64,
    sin_phi: f64,
    /// Start angle.
    psi: f64,
    /// Angular sweep, signed.
    delta: f64,
}

impl ArcCenter {
    fn from_endpoints(arc: &ArcSegment) -> Option<Self> {
        let (mut rx, mut ry) = (arc.rx, arc.ry);
        if !(rx > 0.0 && ry > 0.0) || arc.from == arc.to {
            return None;
        }

        let (sin_phi, cos_phi) = arc.x_axis_rotation.to_radians().sin_cos();
        let dx = 0.5 * (arc.from.x - arc.to.x);
        let dy = 0.5 * (arc.from.y - arc.to.y);
        let x_ = cos_phi * dx + sin_phi * dy;
        let y_ = -sin_phi * dx + cos_phi * dy;

        // Radii too small to span both endpoints are scaled up uniformly.
        let lambda = (x_ * x_) / (rx * rx) + (y_ * y_) / (ry * ry);
        if lambda > 1.0 {
            let s = lambda.sqrt();
            rx *= s;
            ry *= s;
        }

        let num = (rx * ry).powi(2) - (rx * y_).powi(2) - (ry * x_).powi(2);
        let den = (rx * y_).powi(2) + (ry * x_).powi(2);
        let mut r2 = num / den;
        if r2 < 0.0 || !r2.is_finite() {
            r2 = 0.0;
        }
        let mut r = r2.sqrt();
        if arc.large_arc == arc.sweep {
            r = -r;
        }

        let cx_ = r * rx * y_ / ry;
        let cy_ = -r * ry * x_ / rx;
        let center = point(
            cos_phi * cx_ - sin_phi * cy_ + 0.5 * (arc.from.x + arc.to.x),
            sin_phi * cx_ + cos_phi * cy_ + 0.5 * (arc.from.y + arc.to.y),
        );

        let u = ((x_ - cx_) / rx, (y_ - cy_) / ry);
        let v = ((-x_ - cx_) / rx, (-y_ - cy_) / ry);
        let psi = vector_angle((1.0, 0.0), u);
        let mut delta = vector_angle(u, v);
        if arc.sweep && delta < 0.0 {
            delta += 2.0 * PI;
        }
        if !arc.sweep && delta > 0.0 {
            delta -= 2.0 * PI;
        }

        Some(Self {
            center,
            rx,
            ry,
            cos_phi,
            sin_phi,
            psi,
            delta,
        })
    }

    fn vertex(&self, pct: f64) -> Point {
        let (st, ct) = (self.psi + self.delta * pct).sin_cos();
        point(
            self.cos_phi * self.rx * ct - self.sin_phi * self.ry * st + self.center.x,
            self.sin_phi * self.rx * ct + self.cos_phi * self.ry * st + self.center.y,
        )
    }
}

fn vector_angle(u: (f64, f64), v: (f64, f64)) -> f64 {
    let norm = ((u.0 * u.0 + u.1 * u.1) * (v.0 * v.0 + v.1 * v.1)).sqrt();
    let cos = ((u.0 * v.0 + u.1 * v.1) / norm).clamp(-1.0, 1.0);
    let a = cos.acos();
    if u.0 * v.1 > u.1 * v.0 { a } else { -a }
}

/// Flattens an elliptical arc by recursive angular bisection.
///
/// Returns `false` (and appends nothing) for degenerate arcs: a non-positive radius or coincident
/// endpoints.
pub fn arc(out: &mut Vec<Point>, arc: &ArcSegment, tolerance2: f64) -> bool {
    let Some(center) = ArcCenter::from_endpoints(arc) else {
        return false;
    };
    let c1 = center.vertex(0.0);
    let c5 = center.vertex(1.0);
    arc_level(out, &center, 0.0, 1.0, c1, c5, 0, tolerance2);
    true
}

#[allow(clippy::too_many_arguments)]
fn arc_level(
    out: &mut Vec<Point>,
    center: &ArcCenter,
    t1: f64,
    t2: f64,
    c1: Point,
    c5: Point,
    level: u32,
    tolerance2: f64,
) {
    if level > MAX_DEPTH {
        return;
    }
    let range = t2 - t1;
    let half = t1 + 0.5 * range;
    let c2 = center.vertex(t1 + 0.25 * range);
    let c3 = center.vertex(half);
    let c4 = center.vertex(t1 + 0.75 * range);
    if distance_squared(c2, midpoint(c1, c3)) > tolerance2 {
        arc_level(out, center, t1, half, c1, c3, level + 1, tolerance2);
    }
    out.push(c3);
    if distance_squared(c4, midpoint(c3, c5)) > tolerance2 {
        arc_level(out, center, half, t2, c3, c5, level + 1, tolerance2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
        let ab = b - a;
        let len2 = ab.square_length();
        if len2 == 0.0 {
            return (p - a).length();
        }
        let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
        (p - (a + ab * t)).length()
    }

    fn distance_to_polyline(p: Point, line: &[Point]) -> f64 {
        line.windows(2)
            .map(|w| distance_to_segment(p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min)
    }

    fn cubic_at(p: [Point; 4], t: f64) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        point(
            a * p[0].x + b * p[1].x + c * p[2].x + d * p[3].x,
            a * p[0].y + b * p[1].y + c * p[2].y + d * p[3].y,
        )
    }

    fn quadratic_at(p: [Point; 3], t: f64) -> Point {
        let mt = 1.0 - t;
        point(
            mt * mt * p[0].x + 2.0 * mt * t * p[1].x + t * t * p[2].x,
            mt * mt * p[0].y + 2.0 * mt * t * p[1].y + t * t * p[2].y,
        )
    }

    fn random_point(rng: &mut StdRng) -> Point {
        point(rng.gen_range(-100.0..100.0), rng.gen_range(-100.0..100.0))
    }

    #[test]
    fn cubic_stays_within_tolerance_of_true_curve() {
        let mut rng = StdRng::seed_from_u64(42);
        let tol = 0.1;
        for _ in 0..200 {
            let p = [
                random_point(&mut rng),
                random_point(&mut rng),
                random_point(&mut rng),
                random_point(&mut rng),
            ];
            let mut line = vec![p[0]];
            cubic_bezier(&mut line, p[0], p[1], p[2], p[3], tol * tol);
            line.push(p[3]);
            for i in 0..=100 {
                let on_curve = cubic_at(p, i as f64 / 100.0);
                let d = distance_to_polyline(on_curve, &line);
                assert!(d <= 6.0 * tol, "deviation {d} for {p:?}");
            }
        }
    }

    #[test]
    fn quadratic_stays_within_tolerance_of_true_curve() {
        let mut rng = StdRng::seed_from_u64(43);
        let tol = 0.05;
        for _ in 0..200 {
            let p = [
                random_point(&mut rng),
                random_point(&mut rng),
                random_point(&mut rng),
            ];
            let mut line = vec![p[0]];
            quadratic_bezier(&mut line, p[0], p[1], p[2], tol * tol);
            line.push(p[2]);
            for i in 0..=100 {
                let on_curve = quadratic_at(p, i as f64 / 100.0);
                let d = distance_to_polyline(on_curve, &line);
                assert!(d <= 4.0 * tol, "deviation {d} for {p:?}");
            }
        }
    }

    #[test]
    fn straight_cubic_emits_single_midpoint() {
        let mut out = Vec::new();
        cubic_bezier(
            &mut out,
            point(0.0, 0.0),
            point(1.0, 0.0),
            point(2.0, 0.0),
            point(3.0, 0.0),
            0.01,
        );
        assert_eq!(out, vec![point(1.5, 0.0)]);
    }

    #[test]
    fn closed_curves_are_subdivided_and_points_are_not() {
        let o = point(0.0, 0.0);
        let mut out = Vec::new();
        cubic_bezier(&mut out, o, o, o, o, 0.01);
        assert_eq!(out, vec![o]);

        let mut loop_out = Vec::new();
        cubic_bezier(&mut loop_out, o, point(10.0, 10.0), point(-10.0, 10.0), o, 0.01);
        assert!(loop_out.len() > 8);
        assert!(loop_out.iter().any(|p| p.y > 5.0));

        let mut quad_out = Vec::new();
        quadratic_bezier(&mut quad_out, o, point(0.0, 10.0), o, 0.01);
        assert!(quad_out.len() > 1);
        assert!(quad_out.iter().any(|p| p.y > 3.0));
    }

    #[test]
    fn quarter_circle_arc_lies_on_circle() {
        let seg = ArcSegment {
            from: point(10.0, 0.0),
            rx: 10.0,
            ry: 10.0,
            x_axis_rotation: 0.0,
            large_arc: false,
            sweep: true,
            to: point(0.0, 10.0),
        };
        let mut out = Vec::new();
        assert!(arc(&mut out, &seg, 0.01));
        assert!(out.len() > 3);
        for p in &out {
            let r = p.to_vector().length();
            assert!((r - 10.0).abs() < 1e-9, "radius {r}");
            assert!(p.x >= -1e-9 && p.y >= -1e-9, "wrong quadrant: {p:?}");
        }
    }

    #[test]
    fn arc_stays_within_tolerance_of_true_ellipse() {
        let mut rng = StdRng::seed_from_u64(44);
        let tol = 0.1;
        for _ in 0..200 {
            let seg = ArcSegment {
                from: random_point(&mut rng),
                rx: rng.gen_range(1.0..80.0),
                ry: rng.gen_range(1.0..80.0),
                x_axis_rotation: rng.gen_range(0.0..360.0),
                large_arc: rng.gen_bool(0.5),
                sweep: rng.gen_bool(0.5),
                to: random_point(&mut rng),
            };
            let center = ArcCenter::from_endpoints(&seg).expect("non-degenerate");
            let mut line = vec![seg.from];
            arc(&mut line, &seg, tol * tol);
            line.push(seg.to);
            for i in 0..=100 {
                let on_curve = center.vertex(i as f64 / 100.0);
                let d = distance_to_polyline(on_curve, &line);
                assert!(d <= 4.0 * tol, "deviation {d} for {seg:?}");
            }
        }
    }

    #[test]
    fn arc_endpoints_match_after_radius_correction() {
        let seg = ArcSegment {
            from: point(0.0, 0.0),
            rx: 1.0,
            ry: 1.0,
            x_axis_rotation: 0.0,
            large_arc: false,
            sweep: false,
            to: point(10.0, 0.0),
        };
        let center = ArcCenter::from_endpoints(&seg).expect("non-degenerate");
        assert!(distance_squared(center.vertex(0.0), seg.from) < 1e-18);
        assert!(distance_squared(center.vertex(1.0), seg.to) < 1e-18);
    }

    #[test]
    fn degenerate_arcs_are_no_ops() {
        let mut out = Vec::new();
        let base = ArcSegment {
            from: point(0.0, 0.0),
            rx: 5.0,
            ry: 5.0,
            x_axis_rotation: 0.0,
            large_arc: false,
            sweep: true,
            to: point(5.0, 5.0),
        };
        assert!(!arc(&mut out, &ArcSegment { rx: 0.0, ..base }, 0.01));
        assert!(!arc(&mut out, &ArcSegment { ry: -1.0, ..base }, 0.01));
        assert!(!arc(&mut out, &ArcSegment { to: base.from, ..base }, 0.01));
        assert!(out.is_empty());
    }

    #[test]
    fn depth_cap_bounds_vertex_count() {
        let mut out = Vec::new();
        cubic_bezier(
            &mut out,
            point(0.0, 0.0),
            point(1e6, 1e6),
            point(-1e6, 1e6),
            point(0.0, 0.0),
            1e-30,
        );
        assert!(out.len() <= 1 << (MAX_DEPTH + 1));
    }
}
