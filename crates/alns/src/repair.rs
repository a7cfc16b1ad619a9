//! Repair operators: locate free space and hand it to the packer.
//!
//! Same contract as the destroy side: mutate the clone, report success.
//! Chord queries on points outside the circle surface as geometry domain
//! errors; the operators demote those to "no feasible point found" so a bad
//! probe costs one attempt instead of the run.

use rand::rngs::StdRng;
use rand::Rng;

use sawmill_core::error::Result;
use sawmill_core::geometry::{self, ClampPriority, Direction, Rect, EPS};
use sawmill_core::log::Log;
use sawmill_core::shape::{Catalog, IdGen, Shape};

use crate::packer::{self, Packing};

/// Upper bound on rectangle cut-back rounds; each round clears at least one
/// violating shape, so hitting the cap means something is off and the
/// invocation is abandoned as a failure.
const CUT_BACK_LIMIT: usize = 64;

/// Rejection-samples a point inside the circle but outside every kerf box.
fn sample_free_point(log: &Log, rng: &mut StdRng, attempts: usize) -> Option<(f64, f64)> {
    let d = log.diameter();
    for _ in 0..attempts {
        let x = rng.gen_range(0.0..d);
        let y = rng.gen_range(0.0..d);
        if log.point_in_log(x, y) && !log.point_in_occupied(x, y) {
            return Some((x, y));
        }
    }
    None
}

/// Clamps the rectangle to the circle under both priorities and packs both
/// clampings, returning the higher-usage non-empty packing.
fn clamp_and_pack(
    log: &Log,
    rect: Rect,
    catalog: &Catalog,
    ids: &mut IdGen,
) -> Result<Option<Packing>> {
    let d = log.diameter();
    let bounded = Rect::new(
        rect.x_min.max(0.0),
        rect.x_max.min(d),
        rect.y_min.max(0.0),
        rect.y_max.min(d),
    );
    if !bounded.is_valid() {
        return Ok(None);
    }

    let mut best: Option<Packing> = None;
    for priority in [ClampPriority::Width, ClampPriority::Height] {
        let clamped = match geometry::clamp_rect_to_circle(bounded, d, priority) {
            Ok(r) if r.is_valid() => r,
            Ok(_) => continue,
            Err(e) if e.is_geometry_domain() => continue,
            Err(e) => return Err(e),
        };
        let packing = packer::pack_rectangle(&clamped, catalog.types(), log.kerf(), ids)?;
        if packing.is_empty() {
            continue;
        }
        if best.as_ref().map_or(true, |b| packing.rel_usage > b.rel_usage) {
            best = Some(packing);
        }
    }
    Ok(best)
}

/// Verifies every packed shape against the committed state, then adds them
/// all. Rejecting the whole packing on any conflict keeps the log invariants
/// intact without surfacing a heuristic miss as a fatal error.
fn commit_packing(log: &mut Log, packing: Packing) -> bool {
    if packing.is_empty() {
        return false;
    }
    if !packing.shapes.iter().all(|s| log.can_place(s)) {
        return false;
    }
    log.add_shapes(packing.shapes);
    true
}

/// Random-point expansion: grow a rectangle out of a sampled free point
/// toward the circle in all four directions, cut it back past any shape it
/// still clips, then clamp and repack it.
pub fn random_point_expansion(
    log: &mut Log,
    catalog: &Catalog,
    ids: &mut IdGen,
    rng: &mut StdRng,
    max_attempts: usize,
) -> Result<bool> {
    let Some((px, py)) = sample_free_point(log, rng, max_attempts) else {
        return Ok(false);
    };

    let left = geometry::clearance_from_point(log, px, py, Direction::Left)?;
    let right = geometry::clearance_from_point(log, px, py, Direction::Right)?;
    let up = geometry::clearance_from_point(log, px, py, Direction::Up)?;
    let down = geometry::clearance_from_point(log, px, py, Direction::Down)?;
    let mut rect = Rect::new(px - left, px + right, py - down, py + up);

    // The clearances only see the seed's row and column; shapes clipping the
    // rectangle diagonally are cut away, cheapest cut first.
    let kerf = log.kerf();
    for _ in 0..CUT_BACK_LIMIT {
        let Some(violator) = log
            .shapes()
            .iter()
            .find(|s| geometry::shape_in_rect(s, &rect, kerf))
            .cloned()
        else {
            return match clamp_and_pack(log, rect, catalog, ids)? {
                Some(packing) => Ok(commit_packing(log, packing)),
                None => Ok(false),
            };
        };
        let cuts = [
            Rect::new((violator.x_max() + kerf).max(rect.x_min), rect.x_max, rect.y_min, rect.y_max),
            Rect::new(rect.x_min, (violator.x - kerf).min(rect.x_max), rect.y_min, rect.y_max),
            Rect::new(rect.x_min, rect.x_max, (violator.y_max() + kerf).max(rect.y_min), rect.y_max),
            Rect::new(rect.x_min, rect.x_max, rect.y_min, (violator.y - kerf).min(rect.y_max)),
        ];
        let Some(best_cut) = cuts
            .iter()
            .filter(|c| c.is_valid())
            .max_by(|a, b| a.area().total_cmp(&b.area()))
        else {
            return Ok(false);
        };
        rect = *best_cut;
    }
    Ok(false)
}

/// Single extension: replace one shape with the largest catalog type that
/// dominates it in both dimensions and still fits within the shape's size
/// plus its four-directional clearance.
pub fn single_extension(
    log: &mut Log,
    catalog: &Catalog,
    ids: &mut IdGen,
    rng: &mut StdRng,
) -> Result<bool> {
    if log.is_empty() {
        return Ok(false);
    }
    let current = log.shapes()[rng.gen_range(0..log.shape_count())].clone();

    let left = geometry::clearance(log, &current, Direction::Left)?;
    let right = geometry::clearance(log, &current, Direction::Right)?;
    let up = geometry::clearance(log, &current, Direction::Up)?;
    let down = geometry::clearance(log, &current, Direction::Down)?;

    let mut candidates: Vec<_> = catalog
        .types()
        .iter()
        .filter(|t| {
            t.width >= current.width - EPS
                && t.height >= current.height - EPS
                && t.area() > current.area() + EPS
        })
        .collect();
    candidates.sort_by(|a, b| b.area().total_cmp(&a.area()));

    for candidate in candidates {
        if candidate.width > current.width + left + right + EPS {
            continue;
        }
        if candidate.height > current.height + up + down + EPS {
            continue;
        }
        // Grow rightward and upward first, borrow the rest from the other
        // side so the anchor moves as little as possible.
        let dw = candidate.width - current.width;
        let dh = candidate.height - current.height;
        let x = current.x - (dw - right).max(0.0);
        let y = current.y - (dh - down).max(0.0);
        let replacement = Shape::new(ids.next_shape_id(), candidate, x, y);

        let Some(old) = log.remove_shape_by_id(current.id) else {
            return Ok(false);
        };
        if log.can_place(&replacement) {
            log::debug!(
                "single_extension: {}x{} -> {}x{} in log {}",
                old.width,
                old.height,
                replacement.width,
                replacement.height,
                log.id()
            );
            log.add_shape(replacement);
            return Ok(true);
        }
        log.add_shape(old);
    }
    Ok(false)
}

/// Buddy extension: probe eight anchor points just outside a random shape's
/// corners, grow the maximal free rectangle at the best anchor, clamp it to
/// the circle and pack it.
pub fn buddy_extension(
    log: &mut Log,
    catalog: &Catalog,
    ids: &mut IdGen,
    rng: &mut StdRng,
) -> Result<bool> {
    if log.is_empty() || catalog.is_empty() {
        return Ok(false);
    }
    let shape = log.shapes()[rng.gen_range(0..log.shape_count())].clone();
    let offset = 2.0 * log.kerf();

    let anchors = [
        (shape.x - offset, shape.y),
        (shape.x, shape.y - offset),
        (shape.x_max() + offset, shape.y),
        (shape.x_max(), shape.y - offset),
        (shape.x - offset, shape.y_max()),
        (shape.x, shape.y_max() + offset),
        (shape.x_max() + offset, shape.y_max()),
        (shape.x_max(), shape.y_max() + offset),
    ];

    let mut best: Option<Rect> = None;
    for (px, py) in anchors {
        if !log.point_in_log(px, py) || log.point_in_occupied(px, py) {
            continue;
        }
        let left = geometry::clearance_from_point(log, px, py, Direction::Left)?;
        let right = geometry::clearance_from_point(log, px, py, Direction::Right)?;
        let up = geometry::clearance_from_point(log, px, py, Direction::Up)?;
        let down = geometry::clearance_from_point(log, px, py, Direction::Down)?;
        let rect = Rect::new(px - left, px + right, py - down, py + up);
        if !rect.is_valid() {
            continue;
        }
        if best.map_or(true, |b| rect.area() > b.area()) {
            best = Some(rect);
        }
    }

    let Some(rect) = best else {
        return Ok(false);
    };
    match clamp_and_pack(log, rect, catalog, ids)? {
        Some(packing) => Ok(commit_packing(log, packing)),
        None => Ok(false),
    }
}
