//! Destroy operators: free up space so the repair operators can repack it
//! more densely.
//!
//! All three follow the same contract: mutate the log clone in place and
//! return whether anything was removed. Running out of shapes or not finding
//! a worthwhile target is an ordinary failure, never an error.

use rand::rngs::StdRng;
use rand::Rng;

use sawmill_core::error::Result;
use sawmill_core::geometry::{self, ClampPriority, Rect};
use sawmill_core::log::Log;
use sawmill_core::shape::{Catalog, Shape};

/// Candidate rectangles sampled per subspace invocation.
const SUBSPACE_SAMPLES: usize = 5;
/// A rectangle this full is not worth clearing.
const SUBSPACE_MAX_OCCUPANCY: f64 = 0.98;

/// Sampling weight of a shape: Euclidean distance between its dimensions and
/// `(diameter, diameter)`, biasing removal toward odd-shaped pieces.
fn removal_weight(shape: &Shape, diameter: f64) -> f64 {
    let dw = diameter - shape.width;
    let dh = diameter - shape.height;
    (dw * dw + dh * dh).sqrt()
}

/// Picks a shape index with probability proportional to its removal weight.
fn pick_weighted(log: &Log, rng: &mut StdRng) -> Option<usize> {
    if log.is_empty() {
        return None;
    }
    let weights: Vec<f64> = log
        .shapes()
        .iter()
        .map(|s| removal_weight(s, log.diameter()))
        .collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Some(rng.gen_range(0..log.shape_count()));
    }
    let mut target = rng.gen_range(0.0..total);
    for (index, weight) in weights.iter().enumerate() {
        if target < *weight {
            return Some(index);
        }
        target -= weight;
    }
    Some(weights.len() - 1)
}

/// Removes one weighted-random shape. Fails only on an empty log.
pub fn random_destroy(log: &mut Log, rng: &mut StdRng) -> bool {
    match pick_weighted(log, rng) {
        Some(index) => {
            log.remove_shape_at(index);
            true
        }
        None => false,
    }
}

/// Removes a spatial cluster: a weighted-random seed shape plus every shape
/// whose kerf box contains a probe point on a grid extending horizontally or
/// vertically (50/50) from the seed's center. The probe step is the smallest
/// catalog dimension, so no shape between two probes can be missed.
pub fn cluster_destroy(log: &mut Log, catalog: &Catalog, rng: &mut StdRng) -> bool {
    let Some(seed) = pick_weighted(log, rng) else {
        return false;
    };
    let seed_shape = &log.shapes()[seed];
    let (cx, cy) = seed_shape.center();
    let mut doomed = vec![seed_shape.id];

    let step = catalog.min_dimension();
    if step.is_finite() && step > 0.0 {
        let horizontal = rng.gen_bool(0.5);
        for sign in [-1.0, 1.0] {
            let mut offset = step;
            loop {
                let (px, py) = if horizontal {
                    (cx + sign * offset, cy)
                } else {
                    (cx, cy + sign * offset)
                };
                if !log.point_in_log(px, py) {
                    break;
                }
                for shape in log.shapes() {
                    if shape.contains_point(px, py, log.kerf()) {
                        doomed.push(shape.id);
                    }
                }
                offset += step;
            }
        }
    }

    doomed.sort_unstable();
    doomed.dedup();
    log::debug!(
        "cluster_destroy: removing {} shapes around ({cx:.1}, {cy:.1}) in log {}",
        doomed.len(),
        log.id()
    );
    log.remove_shapes_where(|s| doomed.binary_search(&s.id).is_ok()) > 0
}

/// Clears the least occupied of several sampled rectangles.
///
/// Samples candidate rectangles anchored at feasible points with random
/// extents bounded below by the catalog minimums, clamps each to the circle,
/// and removes every shape intersecting the emptiest one, provided it is less
/// than [`SUBSPACE_MAX_OCCUPANCY`] full and intersects at least one shape.
pub fn subspace_destroy(log: &mut Log, catalog: &Catalog, rng: &mut StdRng) -> Result<bool> {
    if log.is_empty() || catalog.is_empty() {
        return Ok(false);
    }
    let d = log.diameter();
    let mut worst: Option<(f64, Rect)> = None;

    for _ in 0..SUBSPACE_SAMPLES {
        let x = rng.gen_range(0.0..d);
        let y = rng.gen_range(0.0..d);
        if !log.point_in_log(x, y) {
            continue;
        }
        if catalog.min_width() >= d - x || catalog.min_height() >= d - y {
            continue;
        }
        let width = rng.gen_range(catalog.min_width()..d - x);
        let height = rng.gen_range(catalog.min_height()..d - y);
        let rect = Rect::new(x, x + width, y, y + height);
        let clamped = match geometry::clamp_rect_to_circle(rect, d, ClampPriority::Height) {
            Ok(r) if r.is_valid() => r,
            Ok(_) => continue,
            Err(e) if e.is_geometry_domain() => continue,
            Err(e) => return Err(e),
        };
        let occupancy = geometry::rect_occupancy(log, &clamped);
        if worst.as_ref().map_or(true, |(o, _)| occupancy < *o) {
            worst = Some((occupancy, clamped));
        }
    }

    let Some((occupancy, rect)) = worst else {
        return Ok(false);
    };
    if occupancy >= SUBSPACE_MAX_OCCUPANCY {
        return Ok(false);
    }
    let kerf = log.kerf();
    let removed = log.remove_shapes_where(|s| geometry::shape_in_rect(s, &rect, kerf));
    log::debug!(
        "subspace_destroy: cleared {removed} shapes from a {:.0}x{:.0} rectangle at {:.2} occupancy",
        rect.width(),
        rect.height(),
        occupancy
    );
    Ok(removed > 0)
}
