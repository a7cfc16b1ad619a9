//! Geometric kernel: circle-chord queries, kerf-aware intersection tests and
//! directional clearance queries.
//!
//! The log cross-section is a circle of radius `r = diameter / 2` centered at
//! `(r, r)`, so both axes share the same chord equation and
//! [`chord_bounds`] answers queries along either axis. All occupancy tests
//! expand shapes by the saw kerf: two boards are compatible only when at
//! least one kerf width of material separates them.

use crate::error::{Error, Result};
use crate::log::Log;
use crate::shape::Shape;

/// Numeric tolerance for edge-touching comparisons.
///
/// Boards are laid out with exactly one kerf between them, so kerf-expanded
/// rectangles touch; the tolerance keeps floating-point touching from
/// registering as overlap.
pub const EPS: f64 = 1e-4;

/// A cardinal movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward smaller x.
    Left,
    /// Toward larger x.
    Right,
    /// Toward larger y.
    Up,
    /// Toward smaller y.
    Down,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];
}

/// Which dimension a circle clamp preserves when a rectangle pokes outside
/// the chord bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClampPriority {
    /// Keep the x-extent, shrink the y-extent to the chords first.
    Width,
    /// Keep the y-extent, shrink the x-extent to the chords first.
    Height,
}

/// An axis-aligned rectangle described by its edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x_min: f64,
    /// Right edge.
    pub x_max: f64,
    /// Bottom edge.
    pub y_min: f64,
    /// Top edge.
    pub y_max: f64,
}

impl Rect {
    /// Creates a rectangle from its edges.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Horizontal extent.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Vertical extent.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Area, zero for degenerate rectangles.
    pub fn area(&self) -> f64 {
        if self.is_valid() {
            self.width() * self.height()
        } else {
            0.0
        }
    }

    /// True when both extents are positive.
    pub fn is_valid(&self) -> bool {
        self.width() > EPS && self.height() > EPS
    }

    /// True if the point lies inside or on the rectangle.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

/// Chord bounds of the circle at coordinate `z` along one axis: the `(min,
/// max)` of the other axis on the circle boundary.
///
/// Solves `r^2 = (z - r)^2 + (w - r)^2` about the center `(r, r)`. Fails with
/// [`Error::GeometryDomain`] when `z` lies outside `[0, diameter]`; callers
/// must guard or treat the failure as "point not in log".
pub fn chord_bounds(diameter: f64, z: f64) -> Result<(f64, f64)> {
    if z < 0.0 || z > diameter {
        return Err(Error::GeometryDomain {
            coordinate: z,
            diameter,
        });
    }
    let r = diameter / 2.0;
    let half = (r * r - (z - r) * (z - r)).max(0.0).sqrt();
    Ok((r - half, r + half))
}

/// True if `(x, y)` lies within the circle, with `tol` slack on the radius.
pub fn point_in_circle(diameter: f64, x: f64, y: f64, tol: f64) -> bool {
    let r = diameter / 2.0;
    let dx = x - r;
    let dy = y - r;
    dx * dx + dy * dy <= (r + tol) * (r + tol)
}

/// Kerf-expanded AABB overlap test between two placed boards.
///
/// Boards separated by exactly one kerf touch after expansion; the [`EPS`]
/// tolerance keeps that legal layout from reading as an intersection.
pub fn shapes_intersect(a: &Shape, b: &Shape, kerf: f64) -> bool {
    a.x - kerf + EPS < b.x_max()
        && a.x_max() + kerf - EPS > b.x
        && a.y - kerf + EPS < b.y_max()
        && a.y_max() + kerf - EPS > b.y
}

/// True if the board's kerf-expanded rectangle overlaps the given rectangle.
pub fn shape_in_rect(shape: &Shape, rect: &Rect, kerf: f64) -> bool {
    shape.x - kerf + EPS < rect.x_max
        && shape.x_max() + kerf - EPS > rect.x_min
        && shape.y - kerf + EPS < rect.y_max
        && shape.y_max() + kerf - EPS > rect.y_min
}

/// The maximal centered rectangle of the given height inscribed in the
/// circle: returns `(width, x_min, x_max)`, or `None` when the height does
/// not fit the diameter.
pub fn max_width_rect(diameter: f64, height: f64) -> Option<(f64, f64, f64)> {
    if height >= diameter {
        return None;
    }
    let r = diameter / 2.0;
    let half = (r * r - (height / 2.0) * (height / 2.0)).sqrt();
    Some((2.0 * half, r - half, r + half))
}

/// Clamps a rectangle so all four corners lie within the circle.
///
/// `priority` decides which dimension is preserved: the other is clamped to
/// the chord bounds first, then the preserved one is re-clamped against the
/// resulting rows/columns. Fails with a domain error when an edge coordinate
/// falls outside `[0, diameter]`.
pub fn clamp_rect_to_circle(rect: Rect, diameter: f64, priority: ClampPriority) -> Result<Rect> {
    let mut r = rect;
    match priority {
        ClampPriority::Height => {
            let (x_lo_bot, x_hi_bot) = chord_bounds(diameter, r.y_min)?;
            let (x_lo_top, x_hi_top) = chord_bounds(diameter, r.y_max)?;
            r.x_min = r.x_min.max(x_lo_bot).max(x_lo_top);
            r.x_max = r.x_max.min(x_hi_bot).min(x_hi_top);

            if r.width() > EPS {
                let (y_lo_l, y_hi_l) = chord_bounds(diameter, r.x_min)?;
                let (y_lo_r, y_hi_r) = chord_bounds(diameter, r.x_max)?;
                r.y_min = r.y_min.max(y_lo_l).max(y_lo_r);
                r.y_max = r.y_max.min(y_hi_l).min(y_hi_r);
            }
        }
        ClampPriority::Width => {
            let (y_lo_l, y_hi_l) = chord_bounds(diameter, r.x_min)?;
            let (y_lo_r, y_hi_r) = chord_bounds(diameter, r.x_max)?;
            r.y_min = r.y_min.max(y_lo_l).max(y_lo_r);
            r.y_max = r.y_max.min(y_hi_l).min(y_hi_r);

            if r.height() > EPS {
                let (x_lo_bot, x_hi_bot) = chord_bounds(diameter, r.y_min)?;
                let (x_lo_top, x_hi_top) = chord_bounds(diameter, r.y_max)?;
                r.x_min = r.x_min.max(x_lo_bot).max(x_lo_top);
                r.x_max = r.x_max.min(x_hi_bot).min(x_hi_top);
            }
        }
    }
    Ok(r)
}

/// Fraction of the rectangle covered by boards (raw footprints, no kerf).
pub fn rect_occupancy(log: &Log, rect: &Rect) -> f64 {
    let area = rect.area();
    if area <= 0.0 {
        return 0.0;
    }
    let covered: f64 = log
        .shapes()
        .iter()
        .map(|s| {
            let w = (s.x_max().min(rect.x_max) - s.x.max(rect.x_min)).max(0.0);
            let h = (s.y_max().min(rect.y_max) - s.y.max(rect.y_min)).max(0.0);
            w * h
        })
        .sum();
    (covered / area).min(1.0)
}

/// Maximum distance the board can slide in `direction` before its
/// kerf-expanded footprint hits another board or the circle boundary.
///
/// A negative gap means the committed state is already corrupted and
/// surfaces as [`Error::InvariantViolation`], never a recoverable condition.
pub fn clearance(log: &Log, shape: &Shape, direction: Direction) -> Result<f64> {
    let kerf = log.kerf();
    let d = log.diameter();

    // The kerf-expanded corners are the ones that must stay inside the
    // circle; the rows/columns they travel along bound the move.
    let dom = |z: f64| z.clamp(0.0, d);
    let mut gap = match direction {
        Direction::Right => {
            let (_, hi_bot) = chord_bounds(d, dom(shape.y - kerf))?;
            let (_, hi_top) = chord_bounds(d, dom(shape.y_max() + kerf))?;
            hi_bot.min(hi_top) - kerf - shape.x_max()
        }
        Direction::Left => {
            let (lo_bot, _) = chord_bounds(d, dom(shape.y - kerf))?;
            let (lo_top, _) = chord_bounds(d, dom(shape.y_max() + kerf))?;
            shape.x - (lo_bot.max(lo_top) + kerf)
        }
        Direction::Up => {
            let (_, hi_l) = chord_bounds(d, dom(shape.x - kerf))?;
            let (_, hi_r) = chord_bounds(d, dom(shape.x_max() + kerf))?;
            hi_l.min(hi_r) - kerf - shape.y_max()
        }
        Direction::Down => {
            let (lo_l, _) = chord_bounds(d, dom(shape.x - kerf))?;
            let (lo_r, _) = chord_bounds(d, dom(shape.x_max() + kerf))?;
            shape.y - (lo_l.max(lo_r) + kerf)
        }
    };

    for other in log.shapes() {
        if other.id == shape.id {
            continue;
        }
        let blocking = match direction {
            Direction::Right | Direction::Left => {
                other.y < shape.y_max() + kerf - EPS && other.y_max() > shape.y - kerf + EPS
            }
            Direction::Up | Direction::Down => {
                other.x < shape.x_max() + kerf - EPS && other.x_max() > shape.x - kerf + EPS
            }
        };
        if !blocking {
            continue;
        }
        // Only blockers entirely on the trailing side are skipped; one
        // overlapping the shape's extent along the slide axis produces a
        // negative candidate and trips the corruption check below.
        let candidate = match direction {
            Direction::Right if other.x_max() > shape.x + EPS => other.x - kerf - shape.x_max(),
            Direction::Left if other.x < shape.x_max() - EPS => shape.x - (other.x_max() + kerf),
            Direction::Up if other.y_max() > shape.y + EPS => other.y - kerf - shape.y_max(),
            Direction::Down if other.y < shape.y_max() - EPS => shape.y - (other.y_max() + kerf),
            _ => continue,
        };
        gap = gap.min(candidate);
    }

    if gap < -EPS {
        return Err(Error::InvariantViolation(format!(
            "negative clearance {gap:.4} for shape {} in log {} moving {:?}",
            shape.id,
            log.id(),
            direction
        )));
    }
    Ok(gap.max(0.0))
}

/// Distance from a free point to the nearest obstacle (kerf-expanded board
/// or circle boundary) in the given direction.
///
/// Returns 0 immediately when the point already lies inside a board. Used by
/// repair operators to expand rectangles out of empty space.
pub fn clearance_from_point(log: &Log, x: f64, y: f64, direction: Direction) -> Result<f64> {
    let kerf = log.kerf();
    let d = log.diameter();

    if log.point_in_occupied(x, y) {
        return Ok(0.0);
    }

    let mut gap = match direction {
        Direction::Right => chord_bounds(d, y)?.1 - x,
        Direction::Left => x - chord_bounds(d, y)?.0,
        Direction::Up => chord_bounds(d, x)?.1 - y,
        Direction::Down => y - chord_bounds(d, x)?.0,
    };

    for shape in log.shapes() {
        let candidate = match direction {
            Direction::Right | Direction::Left => {
                if y < shape.y - kerf || y > shape.y_max() + kerf {
                    continue;
                }
                match direction {
                    Direction::Right if shape.x - kerf >= x => shape.x - kerf - x,
                    Direction::Left if shape.x_max() + kerf <= x => x - (shape.x_max() + kerf),
                    _ => continue,
                }
            }
            Direction::Up | Direction::Down => {
                if x < shape.x - kerf || x > shape.x_max() + kerf {
                    continue;
                }
                match direction {
                    Direction::Up if shape.y - kerf >= y => shape.y - kerf - y,
                    Direction::Down if shape.y_max() + kerf <= y => y - (shape.y_max() + kerf),
                    _ => continue,
                }
            }
        };
        gap = gap.min(candidate);
    }

    Ok(gap.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::Log;
    use crate::shape::ShapeType;

    fn shape(id: u64, w: f64, h: f64, x: f64, y: f64) -> Shape {
        let t = ShapeType::new(0, w, h);
        Shape::new(id, &t, x, y)
    }

    #[test]
    fn test_chord_bounds_midline() {
        // At the circle's midline the chord spans the full diameter.
        let (lo, hi) = chord_bounds(560.0, 280.0).unwrap();
        assert!(lo.abs() < EPS);
        assert!((hi - 560.0).abs() < EPS);
    }

    #[test]
    fn test_chord_bounds_roundtrip() {
        // Composing chord bounds with its own output recovers the same chord.
        let d = 450.0;
        let (lo, hi) = chord_bounds(d, 100.0).unwrap();
        let (lo2, hi2) = chord_bounds(d, lo).unwrap();
        assert!((lo2 - (d - hi2)).abs() < EPS, "chord must be symmetric");
        assert!(hi2 <= d + EPS && lo2 >= -EPS);
        assert!(hi > lo);
    }

    #[test]
    fn test_chord_bounds_domain_error() {
        assert!(chord_bounds(560.0, -0.1).is_err());
        assert!(chord_bounds(560.0, 560.1).is_err());
        assert!(chord_bounds(560.0, 0.0).is_ok());
        assert!(chord_bounds(560.0, 560.0).is_ok());
    }

    #[test]
    fn test_shapes_intersect_overlap_and_kerf() {
        let a = shape(0, 100.0, 50.0, 0.0, 0.0);
        let b = shape(1, 100.0, 50.0, 50.0, 0.0);
        assert!(shapes_intersect(&a, &b, 0.0));

        // Exactly one kerf apart: legal, must not intersect.
        let c = shape(2, 100.0, 50.0, 103.0, 0.0);
        assert!(!shapes_intersect(&a, &c, 3.0));

        // Less than one kerf apart: overlap.
        let e = shape(3, 100.0, 50.0, 102.0, 0.0);
        assert!(shapes_intersect(&a, &e, 3.0));

        // Far away in y.
        let f = shape(4, 100.0, 50.0, 0.0, 60.0);
        assert!(!shapes_intersect(&a, &f, 3.0));
    }

    #[test]
    fn test_max_width_rect() {
        let d = 560.0;
        let (w, x_min, x_max) = max_width_rect(d, 0.0).unwrap();
        assert!((w - d).abs() < EPS);
        assert!(x_min.abs() < EPS && (x_max - d).abs() < EPS);

        // Height equal to diameter never fits.
        assert!(max_width_rect(d, d).is_none());

        // Pythagorean check: height 120 in a 200 circle leaves width 160.
        let (w, _, _) = max_width_rect(200.0, 120.0).unwrap();
        assert!((w - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_rect_to_circle_keeps_corners_inside() {
        let d = 560.0;
        let rect = Rect::new(0.0, 560.0, 400.0, 500.0);
        let clamped = clamp_rect_to_circle(rect, d, ClampPriority::Height).unwrap();
        assert!(clamped.is_valid());
        for (x, y) in [
            (clamped.x_min, clamped.y_min),
            (clamped.x_min, clamped.y_max),
            (clamped.x_max, clamped.y_min),
            (clamped.x_max, clamped.y_max),
        ] {
            assert!(point_in_circle(d, x, y, EPS), "corner ({x}, {y}) outside");
        }
    }

    #[test]
    fn test_clearance_against_circle_and_shape() {
        let mut log = Log::new(0, 560.0, 3.0);
        let a = shape(0, 100.0, 50.0, 200.0, 255.0);
        let b = shape(1, 100.0, 50.0, 320.0, 255.0);
        log.add_shape(a.clone());
        log.add_shape(b.clone());

        // a can slide right until one kerf short of b.
        let gap = clearance(&log, &a, Direction::Right).unwrap();
        assert!((gap - (320.0 - 3.0 - 300.0)).abs() < EPS);

        // b slides right until its kerf-expanded corners reach the circle.
        let gap_b = clearance(&log, &b, Direction::Right).unwrap();
        let (_, hi) = chord_bounds(560.0, 255.0 - 3.0).unwrap();
        let (_, hi2) = chord_bounds(560.0, 305.0 + 3.0).unwrap();
        assert!((gap_b - (hi.min(hi2) - 3.0 - 420.0)).abs() < EPS);
    }

    #[test]
    fn test_clearance_errors_on_overlapping_shapes() {
        let mut log = Log::new(0, 560.0, 3.0);
        let a = shape(0, 100.0, 100.0, 200.0, 230.0);
        let b = shape(1, 100.0, 100.0, 250.0, 230.0);
        log.add_shape(a.clone());
        log.add_shape(b.clone());

        // A slide query on a corrupted state must not report the circle
        // bound; the overlapping neighbour yields a negative gap.
        let err = clearance(&log, &a, Direction::Right).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
        assert!(clearance(&log, &b, Direction::Left).is_err());
    }

    #[test]
    fn test_clearance_from_point_zero_inside_shape() {
        let mut log = Log::new(0, 560.0, 3.0);
        log.add_shape(shape(0, 100.0, 50.0, 200.0, 255.0));
        let gap = clearance_from_point(&log, 250.0, 280.0, Direction::Right).unwrap();
        assert_eq!(gap, 0.0);
    }

    #[test]
    fn test_clearance_from_point_hits_kerf_boundary() {
        let mut log = Log::new(0, 560.0, 3.0);
        log.add_shape(shape(0, 100.0, 50.0, 300.0, 255.0));
        // Probing from the left of the shape along its row.
        let gap = clearance_from_point(&log, 100.0, 280.0, Direction::Right).unwrap();
        assert!((gap - (300.0 - 3.0 - 100.0)).abs() < EPS);
    }

    #[test]
    fn test_rect_occupancy() {
        let mut log = Log::new(0, 560.0, 3.0);
        log.add_shape(shape(0, 100.0, 100.0, 230.0, 230.0));
        let rect = Rect::new(230.0, 430.0, 230.0, 330.0);
        // Shape covers half of the 200x100 rectangle.
        let occ = rect_occupancy(&log, &rect);
        assert!((occ - 0.5).abs() < 1e-9);
    }
}
