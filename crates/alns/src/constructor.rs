//! Greedy initial construction.
//!
//! The circle is decomposed into a central band, north and south caps, the
//! two upper corners beside the cap, and top/bottom edge strips. Each region
//! is filled through the packer; the south side reuses the north solution
//! mirrored about the horizontal midline. The band height is chosen by
//! evaluating every candidate height class and keeping the one with the best
//! combined relative usage of band plus caps.

use sawmill_core::error::Result;
use sawmill_core::geometry::{self, Rect, EPS};
use sawmill_core::log::Log;
use sawmill_core::shape::{Catalog, IdGen, Shape};

use crate::packer::{self, Packing};

/// The winning band evaluation, carried until commit.
struct Plan {
    score: f64,
    band_height: f64,
    central: Packing,
    /// North cap packing and its class height, when any cap class fits.
    cap: Option<(Packing, f64)>,
}

/// Seeds an empty log: evaluates all band heights, commits the best plan,
/// then fills corners and edge strips against the remaining area. A log in
/// which nothing fits is left empty.
pub fn greedy_construct(log: &mut Log, catalog: &Catalog, ids: &mut IdGen) -> Result<()> {
    let d = log.diameter();
    let k = log.kerf();

    let mut band_heights: Vec<f64> = catalog
        .types()
        .iter()
        .map(|t| t.height)
        .filter(|&h| h + 2.0 * k < d)
        .collect();
    band_heights.sort_by(f64::total_cmp);
    band_heights.dedup();

    let mut best: Option<Plan> = None;
    for h in band_heights {
        let Some(plan) = evaluate_band(log, catalog, ids, h)? else {
            continue;
        };
        if best.as_ref().map_or(true, |b| plan.score > b.score) {
            best = Some(plan);
        }
    }
    let Some(plan) = best else {
        log::info!("log {}: no catalog type fits, leaving empty", log.id());
        return Ok(());
    };
    log::info!(
        "log {}: band height {:.0} chosen at {:.3} relative usage",
        log.id(),
        plan.band_height,
        plan.score
    );

    let h = plan.band_height;
    for shape in plan.central.shapes {
        commit(log, shape);
    }

    let mut cap_height = 0.0;
    if let Some((cap, h_n)) = plan.cap {
        cap_height = h_n;
        for shape in cap.shapes {
            commit_mirrored(log, ids, &shape);
            commit(log, shape);
        }
    }

    // Corners beside the cap row, then the strips above/below everything.
    let y_north = (d + h) / 2.0 + k;
    if cap_height > 0.0 {
        for west in [true, false] {
            fill_corner(log, catalog, ids, cap_height, y_north, west)?;
        }
    }
    fill_edge_strips(log, catalog, ids, h, cap_height)?;

    log.is_feasible()?;
    Ok(())
}

/// Packs the central band of height `h` and its best north cap, returning
/// the combined relative usage as the plan score.
fn evaluate_band(log: &Log, catalog: &Catalog, ids: &mut IdGen, h: f64) -> Result<Option<Plan>> {
    let d = log.diameter();
    let k = log.kerf();

    // Band rectangle includes the kerf margin rows; its width is the chord
    // at those rows, so kerf-expanded board corners stay on or inside the
    // circle.
    let Some((_, x_lo, x_hi)) = geometry::max_width_rect(d, h + 2.0 * k) else {
        return Ok(None);
    };
    let band = Rect::new(x_lo, x_hi, (d - h) / 2.0 - k, (d + h) / 2.0 + k);
    if !band.is_valid() {
        return Ok(None);
    }
    let central = packer::pack_rectangle(&band, catalog.types(), k, ids)?;
    if central.is_empty() {
        return Ok(None);
    }

    // North cap: its own best height class, bounded by the space between the
    // band and the circle top.
    let cap_limit = (d - h) / 2.0 - 2.0 * k;
    let mut cap_heights: Vec<f64> = catalog
        .types()
        .iter()
        .map(|t| t.height)
        .filter(|&h_n| h_n < cap_limit)
        .collect();
    cap_heights.sort_by(f64::total_cmp);
    cap_heights.dedup();

    let mut cap_best: Option<(Packing, f64, Rect)> = None;
    for h_n in cap_heights {
        let top = (d + h) / 2.0 + h_n + 2.0 * k;
        let (cap_lo, cap_hi) = geometry::chord_bounds(d, top)?;
        let rect = Rect::new(cap_lo, cap_hi, (d + h) / 2.0, top);
        if !rect.is_valid() {
            continue;
        }
        let packing = packer::pack_rectangle(&rect, catalog.types(), k, ids)?;
        if packing.is_empty() {
            continue;
        }
        let better = cap_best
            .as_ref()
            .map_or(true, |(p, _, _)| packing.placed_area() > p.placed_area());
        if better {
            cap_best = Some((packing, h_n, rect));
        }
    }

    let score = match &cap_best {
        Some((cap, _, rect)) => {
            (central.placed_area() + 2.0 * cap.placed_area()) / (band.area() + 2.0 * rect.area())
        }
        None => central.placed_area() / band.area(),
    };
    Ok(Some(Plan {
        score,
        band_height: h,
        central,
        cap: cap_best.map(|(packing, h_n, _)| (packing, h_n)),
    }))
}

/// Fills the corner arc beside the cap row (west or east), mirrored south.
fn fill_corner(
    log: &mut Log,
    catalog: &Catalog,
    ids: &mut IdGen,
    cap_height: f64,
    y_north: f64,
    west: bool,
) -> Result<()> {
    let d = log.diameter();
    let k = log.kerf();

    // The corner is bounded laterally by the outermost cap-row shape.
    let bound_x = log
        .shapes()
        .iter()
        .filter(|s| s.y >= y_north - EPS)
        .map(|s| if west { s.x } else { s.x_max() })
        .fold(if west { f64::INFINITY } else { f64::NEG_INFINITY }, |a, b| {
            if west {
                a.min(b)
            } else {
                a.max(b)
            }
        });
    if !bound_x.is_finite() {
        return Ok(());
    }

    let mut class_heights: Vec<f64> = catalog
        .types()
        .iter()
        .map(|t| t.height)
        .filter(|&h_m| h_m < cap_height)
        .collect();
    class_heights.sort_by(f64::total_cmp);
    class_heights.dedup();

    let mut best: Option<Packing> = None;
    for h_m in class_heights {
        let top = y_north + h_m + k;
        if top >= d {
            continue;
        }
        let (lo, hi) = geometry::chord_bounds(d, top)?;
        let rect = if west {
            Rect::new(lo, bound_x, y_north - k, top)
        } else {
            Rect::new(bound_x, hi, y_north - k, top)
        };
        if !rect.is_valid() {
            continue;
        }
        let packing = packer::pack_rectangle(&rect, catalog.types(), k, ids)?;
        if packing.is_empty() {
            continue;
        }
        if best.as_ref().map_or(true, |b| packing.rel_usage > b.rel_usage) {
            best = Some(packing);
        }
    }

    if let Some(packing) = best {
        for shape in packing.shapes {
            commit_mirrored(log, ids, &shape);
            commit(log, shape);
        }
    }
    Ok(())
}

/// Fills the strip between the cap and the circle top, mirrored south.
fn fill_edge_strips(
    log: &mut Log,
    catalog: &Catalog,
    ids: &mut IdGen,
    band_height: f64,
    cap_height: f64,
) -> Result<()> {
    let d = log.diameter();
    let k = log.kerf();
    let strip_y = (d + band_height) / 2.0 + cap_height + 2.0 * k;

    let mut class_heights: Vec<f64> = catalog
        .types()
        .iter()
        .map(|t| t.height)
        .filter(|&h_t| strip_y + h_t + k < d)
        .collect();
    class_heights.sort_by(f64::total_cmp);
    class_heights.dedup();

    let mut best: Option<Packing> = None;
    for h_t in class_heights {
        let top = strip_y + h_t + k;
        let (lo, hi) = geometry::chord_bounds(d, top)?;
        let rect = Rect::new(lo, hi, strip_y - k, top);
        if !rect.is_valid() {
            continue;
        }
        let packing = packer::pack_rectangle(&rect, catalog.types(), k, ids)?;
        if packing.is_empty() {
            continue;
        }
        if best.as_ref().map_or(true, |b| packing.rel_usage > b.rel_usage) {
            best = Some(packing);
        }
    }

    if let Some(packing) = best {
        for shape in packing.shapes {
            commit_mirrored(log, ids, &shape);
            commit(log, shape);
        }
    }
    Ok(())
}

/// Adds a board when its placement is legal against the committed state.
fn commit(log: &mut Log, shape: Shape) -> bool {
    if log.can_place(&shape) {
        log.add_shape(shape);
        true
    } else {
        false
    }
}

/// Adds the board's mirror image about the horizontal midline.
fn commit_mirrored(log: &mut Log, ids: &mut IdGen, shape: &Shape) -> bool {
    let mirrored = Shape {
        id: ids.next_shape_id(),
        type_id: shape.type_id,
        width: shape.width,
        height: shape.height,
        x: shape.x,
        y: log.diameter() - shape.y - shape.height,
    };
    commit(log, mirrored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sawmill_core::shape::ShapeType;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            ShapeType::new(0, 100.0, 100.0),
            ShapeType::new(0, 150.0, 50.0),
        ])
        .with_transposed()
    }

    #[test]
    fn test_construct_fills_log_feasibly() {
        let mut log = Log::new(0, 560.0, 3.0);
        let mut ids = IdGen::new();
        greedy_construct(&mut log, &catalog(), &mut ids).unwrap();

        assert!(!log.is_empty());
        assert!(log.efficiency() > 0.0);
        log.is_feasible().unwrap();
    }

    #[test]
    fn test_construct_uses_caps_and_band() {
        let mut log = Log::new(0, 560.0, 3.0);
        let mut ids = IdGen::new();
        greedy_construct(&mut log, &catalog(), &mut ids).unwrap();

        // Boards both above and below the midline.
        let above = log.shapes().iter().filter(|s| s.center().1 > 280.0).count();
        let below = log.shapes().iter().filter(|s| s.center().1 < 280.0).count();
        assert!(above > 0);
        assert!(below > 0);
        // The big circle fits several rows.
        assert!(log.shape_count() >= 6);
    }

    #[test]
    fn test_construct_leaves_impossible_log_empty() {
        let mut log = Log::new(0, 80.0, 3.0);
        let mut ids = IdGen::new();
        greedy_construct(&mut log, &catalog(), &mut ids).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_construct_small_log_single_board() {
        // 160mm circle: one 100x100 fits (kerf box diagonal 149 < 160), the
        // caps cannot hold anything.
        let mut log = Log::new(0, 160.0, 3.0);
        let mut ids = IdGen::new();
        let small = Catalog::new(vec![ShapeType::new(0, 100.0, 100.0)]);
        greedy_construct(&mut log, &small, &mut ids).unwrap();
        assert_eq!(log.shape_count(), 1);
        log.is_feasible().unwrap();
    }
}
