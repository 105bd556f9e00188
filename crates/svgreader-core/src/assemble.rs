//! Output assembly: color buckets, endpoint joining, simplification and travel-order reordering.

use crate::geom::{Point, Vector, distance_squared, is_finite, point};
use crate::notify::{Notifier, Severity};
use crate::path::Subpath;
use crate::units::ToleranceProfile;
use serde::Serialize;
use std::collections::BTreeMap;

/// Join counts above this are reported.
const JOIN_REPORT_THRESHOLD: usize = 100;
/// Vertex reductions above this percentage are reported.
const OPTIMIZE_REPORT_PERCENT: f64 = 10.0;

/// A referenced raster image, placed in mm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Raster {
    pub position: Point,
    pub size: Vector,
    pub reference: String,
}

/// Final result: polylines in mm grouped by `"#rrggbb"` stroke key, plus raster placements.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseOutput {
    pub boundaries: BTreeMap<String, Vec<Subpath>>,
    pub rasters: Vec<Raster>,
}

impl ParseOutput {
    pub fn subpath_count(&self) -> usize {
        self.boundaries.values().map(Vec::len).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.boundaries.values().flatten().map(Vec::len).sum()
    }
}

/// Accumulates world-space geometry (already in mm) as the tree is walked.
#[derive(Debug)]
pub struct Assembler {
    tolerances: ToleranceProfile,
    boundaries: BTreeMap<String, Vec<Subpath>>,
    rasters: Vec<Raster>,
    joins: usize,
}

impl Assembler {
    pub fn new(tolerances: ToleranceProfile) -> Self {
        Self {
            tolerances,
            boundaries: BTreeMap::new(),
            rasters: Vec::new(),
            joins: 0,
        }
    }

    /// Adds one subpath to the `key` bucket.
    ///
    /// Non-finite vertices are dropped and subpaths left with fewer than two vertices are
    /// discarded. A subpath starting where the bucket's last subpath ends is appended to it,
    /// without repeating the shared vertex.
    pub fn fold_subpath(&mut self, key: &str, subpath: Subpath) {
        let subpath: Subpath = subpath.into_iter().filter(|p| is_finite(*p)).collect();
        if subpath.len() < 2 {
            return;
        }
        let bucket = self.boundaries.entry(key.to_string()).or_default();
        if let Some(last) = bucket.last_mut() {
            if let (Some(&end), Some(&start)) = (last.last(), subpath.first()) {
                if distance_squared(end, start) < self.tolerances.epsilon2 {
                    last.extend_from_slice(&subpath[1..]);
                    self.joins += 1;
                    return;
                }
            }
        }
        bucket.push(subpath);
    }

    pub fn push_raster(&mut self, raster: Raster) {
        self.rasters.push(raster);
    }

    pub fn join_count(&self) -> usize {
        self.joins
    }

    /// Optionally simplifies and reorders every bucket, then reports statistics.
    pub fn finish(self, optimize: bool, notifier: &mut dyn Notifier) -> ParseOutput {
        let Assembler {
            tolerances,
            mut boundaries,
            rasters,
            joins,
        } = self;

        if optimize {
            if joins > JOIN_REPORT_THRESHOLD {
                notifier.notify(
                    Severity::Notice,
                    &format!("joined many line segments: {joins}"),
                );
            }

            let mut before = 0usize;
            let mut after = 0usize;
            for subpaths in boundaries.values_mut() {
                for subpath in subpaths.iter_mut() {
                    before += subpath.len();
                    *subpath = simplify(subpath, tolerances.tol2_half);
                    after += subpath.len();
                }
                reorder(subpaths);
            }
            tracing::debug!(before, after, "simplified polylines");
            if before > 0 {
                let percent = 100.0 * (before - after) as f64 / before as f64;
                if percent > OPTIMIZE_REPORT_PERCENT {
                    notifier.notify(
                        Severity::Notice,
                        &format!("polylines optimized by {percent:.0}%"),
                    );
                }
            }
        }

        ParseOutput { boundaries, rasters }
    }
}

/// Vertex clustering followed by Douglas-Peucker, both at squared tolerance `tolerance2`.
///
/// The first and last vertices always survive, so closed subpaths stay closed.
pub fn simplify(points: &[Point], tolerance2: f64) -> Subpath {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let last = points.len() - 1;

    let mut clustered = vec![points[0]];
    let mut anchor = 0;
    for (i, &p) in points.iter().enumerate().skip(1) {
        if distance_squared(p, points[anchor]) < tolerance2 {
            continue;
        }
        clustered.push(p);
        anchor = i;
    }
    if anchor < last {
        clustered.push(points[last]);
    }

    let keep = douglas_peucker(&clustered, tolerance2);
    clustered
        .into_iter()
        .zip(keep)
        .filter_map(|(p, kept)| kept.then_some(p))
        .collect()
}

/// Marks the vertices that survive Douglas-Peucker. Uses an explicit stack so long polylines
/// cannot exhaust the call stack.
fn douglas_peucker(points: &[Point], tolerance2: f64) -> Vec<bool> {
    let n = points.len();
    let mut keep = vec![false; n];
    if n == 0 {
        return keep;
    }
    keep[0] = true;
    keep[n - 1] = true;
    let mut stack = vec![(0usize, n - 1)];
    while let Some((j, k)) = stack.pop() {
        if k <= j + 1 {
            continue;
        }
        let mut max_index = j;
        let mut max_d2 = 0.0;
        for i in j + 1..k {
            let d2 = segment_distance_squared(points[i], points[j], points[k]);
            if d2 > max_d2 {
                max_index = i;
                max_d2 = d2;
            }
        }
        if max_d2 > tolerance2 {
            keep[max_index] = true;
            stack.push((max_index, k));
            stack.push((j, max_index));
        }
    }
    keep
}

/// Squared distance from `p` to the segment `a`-`b`.
fn segment_distance_squared(p: Point, a: Point, b: Point) -> f64 {
    let u = b - a;
    let w = p - a;
    let cw = w.dot(u);
    if cw <= 0.0 {
        return distance_squared(p, a);
    }
    let cu = u.dot(u);
    if cu <= cw {
        return distance_squared(p, b);
    }
    distance_squared(p, a + u * (cw / cu))
}

/// Greedy nearest-neighbour ordering: starting at the origin, repeatedly picks the subpath whose
/// start is closest to the current end. Ties go to the earliest candidate.
pub fn reorder(subpaths: &mut [Subpath]) {
    let mut cursor = point(0.0, 0.0);
    for i in 0..subpaths.len() {
        let mut best = i;
        let mut best_d2 = f64::INFINITY;
        for (j, candidate) in subpaths.iter().enumerate().skip(i) {
            let Some(&start) = candidate.first() else {
                continue;
            };
            let d2 = distance_squared(cursor, start);
            if d2 < best_d2 {
                best = j;
                best_d2 = d2;
            }
        }
        subpaths.swap(i, best);
        if let Some(&end) = subpaths[i].last() {
            cursor = end;
        }
    }
}
