//! A log: circular stock to be packed with boards.
//!
//! The log owns its shapes as plain values; cloning a log yields an
//! independent snapshot, which is how the ALNS driver implements its
//! copy-then-commit mutation pattern.

use crate::error::{Error, Result};
use crate::geometry::{self, EPS};
use crate::shape::Shape;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A circular stock piece holding placed boards.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Log {
    id: usize,
    diameter: f64,
    kerf: f64,
    volume: f64,
    volume_used: f64,
    /// Last score computed by the driver for this log.
    pub score: f64,
    shapes: Vec<Shape>,
}

impl Log {
    /// Creates an empty log with the given diameter and saw kerf, both in
    /// millimeters.
    pub fn new(id: usize, diameter: f64, kerf: f64) -> Self {
        let r = diameter / 2.0;
        Self {
            id,
            diameter,
            kerf,
            volume: std::f64::consts::PI * r * r,
            volume_used: 0.0,
            score: 0.0,
            shapes: Vec::new(),
        }
    }

    /// Log id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Cross-section diameter.
    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    /// Saw kerf applied around every board.
    pub fn kerf(&self) -> f64 {
        self.kerf
    }

    /// Total cross-section area.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Area currently covered by boards.
    pub fn volume_used(&self) -> f64 {
        self.volume_used
    }

    /// Area not covered by boards.
    pub fn volume_unused(&self) -> f64 {
        self.volume - self.volume_used
    }

    /// Fraction of the cross-section covered by boards.
    pub fn efficiency(&self) -> f64 {
        if self.volume > 0.0 {
            self.volume_used / self.volume
        } else {
            0.0
        }
    }

    /// Selection weight for the driver's log roulette: relative inefficiency.
    pub fn selection_weight(&self) -> f64 {
        1.0 - self.efficiency()
    }

    /// Material lost to the blade: sum of the kerf annulus areas of all
    /// boards. Re-derivable from the shape set alone.
    pub fn saw_dust(&self) -> f64 {
        self.shapes.iter().map(|s| s.kerf_area(self.kerf)).sum()
    }

    /// The placed boards.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Number of placed boards.
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// True when the log holds no boards.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Places a board, updating the used-volume bookkeeping.
    pub fn add_shape(&mut self, shape: Shape) {
        log::debug!(
            "log {}: placing shape {} ({}x{}) at ({:.2}, {:.2})",
            self.id,
            shape.id,
            shape.width,
            shape.height,
            shape.x,
            shape.y
        );
        self.volume_used += shape.area();
        self.shapes.push(shape);
    }

    /// Places several boards at once.
    pub fn add_shapes(&mut self, shapes: impl IntoIterator<Item = Shape>) {
        for shape in shapes {
            self.add_shape(shape);
        }
    }

    /// Removes the board at `index` and returns it. The instance id is
    /// retired; removed shapes are never reused.
    pub fn remove_shape_at(&mut self, index: usize) -> Shape {
        let shape = self.shapes.swap_remove(index);
        self.volume_used -= shape.area();
        log::debug!("log {}: removed shape {}", self.id, shape.id);
        shape
    }

    /// Removes a board by instance id, if present.
    pub fn remove_shape_by_id(&mut self, id: u64) -> Option<Shape> {
        let index = self.shapes.iter().position(|s| s.id == id)?;
        Some(self.remove_shape_at(index))
    }

    /// Removes every board matching the predicate, returning how many were
    /// removed.
    pub fn remove_shapes_where(&mut self, mut pred: impl FnMut(&Shape) -> bool) -> usize {
        let before = self.shapes.len();
        let mut removed_area = 0.0;
        self.shapes.retain(|s| {
            if pred(s) {
                removed_area += s.area();
                false
            } else {
                true
            }
        });
        self.volume_used -= removed_area;
        before - self.shapes.len()
    }

    /// Translates the board at `index`. Callers are responsible for having
    /// verified the destination (via clearance or an explicit free check).
    pub fn translate_shape(&mut self, index: usize, dx: f64, dy: f64) {
        let shape = &mut self.shapes[index];
        shape.x += dx;
        shape.y += dy;
    }

    /// Chord bounds of the circle at coordinate `z`; see
    /// [`geometry::chord_bounds`].
    pub fn edge_positions(&self, z: f64) -> Result<(f64, f64)> {
        geometry::chord_bounds(self.diameter, z)
    }

    /// True iff `(x, y)` lies within `[0, diameter]^2` and within the circle.
    pub fn point_in_log(&self, x: f64, y: f64) -> bool {
        x >= 0.0
            && x <= self.diameter
            && y >= 0.0
            && y <= self.diameter
            && geometry::point_in_circle(self.diameter, x, y, EPS)
    }

    /// True iff the point falls inside any board's kerf-expanded rectangle.
    pub fn point_in_occupied(&self, x: f64, y: f64) -> bool {
        self.shapes
            .iter()
            .any(|s| s.contains_point(x, y, self.kerf))
    }

    /// True iff the board's kerf-expanded corners all lie within the circle.
    pub fn shape_within_log(&self, shape: &Shape) -> bool {
        let k = self.kerf;
        let corners = [
            (shape.x - k, shape.y - k),
            (shape.x - k, shape.y_max() + k),
            (shape.x_max() + k, shape.y - k),
            (shape.x_max() + k, shape.y_max() + k),
        ];
        corners
            .iter()
            .all(|&(x, y)| geometry::point_in_circle(self.diameter, x, y, EPS))
    }

    /// True iff the board could be committed as-is: inside the circle and at
    /// least one kerf away from every other board. A board already in the log
    /// is skipped by id, so the check also answers move-destination queries.
    pub fn can_place(&self, candidate: &Shape) -> bool {
        self.shape_within_log(candidate)
            && self
                .shapes
                .iter()
                .filter(|other| other.id != candidate.id)
                .all(|other| !geometry::shapes_intersect(other, candidate, self.kerf))
    }

    /// Used volume re-derived from the shape set, for consistency checks.
    pub fn derived_volume_used(&self) -> f64 {
        self.shapes.iter().map(Shape::area).sum()
    }

    /// Post-hoc feasibility sweep: pairwise kerf overlap plus containment
    /// over all boards. A failure indicates a logic defect upstream, never a
    /// condition to silently repair.
    pub fn is_feasible(&self) -> Result<()> {
        for (i, a) in self.shapes.iter().enumerate() {
            if !self.shape_within_log(a) {
                return Err(Error::InvariantViolation(format!(
                    "shape {} at ({:.2}, {:.2}) falls outside log {}",
                    a.id, a.x, a.y, self.id
                )));
            }
            for b in &self.shapes[i + 1..] {
                if geometry::shapes_intersect(a, b, self.kerf) {
                    return Err(Error::InvariantViolation(format!(
                        "shapes {} and {} intersect in log {}",
                        a.id, b.id, self.id
                    )));
                }
            }
        }
        let derived = self.derived_volume_used();
        if (derived - self.volume_used).abs() > EPS {
            return Err(Error::InvariantViolation(format!(
                "log {}: volume_used {:.4} != derived {:.4}",
                self.id, self.volume_used, derived
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeType;

    fn shape(id: u64, w: f64, h: f64, x: f64, y: f64) -> Shape {
        Shape::new(id, &ShapeType::new(0, w, h), x, y)
    }

    #[test]
    fn test_volume_bookkeeping() {
        let mut log = Log::new(0, 560.0, 3.0);
        assert_eq!(log.volume_used(), 0.0);

        log.add_shape(shape(0, 100.0, 100.0, 200.0, 200.0));
        log.add_shape(shape(1, 150.0, 50.0, 100.0, 320.0));
        assert!((log.volume_used() - 17_500.0).abs() < 1e-9);
        assert!((log.derived_volume_used() - log.volume_used()).abs() < 1e-9);

        let removed = log.remove_shape_by_id(0).unwrap();
        assert_eq!(removed.id, 0);
        assert!((log.volume_used() - 7_500.0).abs() < 1e-9);
        assert!(log.remove_shape_by_id(42).is_none());
    }

    #[test]
    fn test_efficiency_and_selection_weight() {
        let mut log = Log::new(0, 200.0, 3.0);
        assert_eq!(log.efficiency(), 0.0);
        assert_eq!(log.selection_weight(), 1.0);

        log.add_shape(shape(0, 100.0, 100.0, 50.0, 50.0));
        let expected = 10_000.0 / (std::f64::consts::PI * 100.0 * 100.0);
        assert!((log.efficiency() - expected).abs() < 1e-9);
        assert!((log.selection_weight() - (1.0 - expected)).abs() < 1e-9);
    }

    #[test]
    fn test_point_in_log() {
        let log = Log::new(0, 560.0, 3.0);
        assert!(log.point_in_log(280.0, 280.0));
        assert!(log.point_in_log(280.0, 0.0));
        // Square corner is outside the circle.
        assert!(!log.point_in_log(1.0, 1.0));
        assert!(!log.point_in_log(-1.0, 280.0));
    }

    #[test]
    fn test_feasibility_detects_overlap() {
        let mut log = Log::new(0, 560.0, 3.0);
        log.add_shape(shape(0, 100.0, 100.0, 200.0, 200.0));
        assert!(log.is_feasible().is_ok());

        log.add_shape(shape(1, 100.0, 100.0, 250.0, 250.0));
        assert!(log.is_feasible().is_err());
    }

    #[test]
    fn test_feasibility_detects_out_of_bounds() {
        let mut log = Log::new(0, 560.0, 3.0);
        // Corner of the kerf box pokes outside the circle.
        log.add_shape(shape(0, 100.0, 100.0, 5.0, 5.0));
        assert!(log.is_feasible().is_err());
    }

    #[test]
    fn test_clone_is_independent_snapshot() {
        let mut log = Log::new(0, 560.0, 3.0);
        log.add_shape(shape(0, 100.0, 100.0, 200.0, 200.0));

        let mut snapshot = log.clone();
        snapshot.remove_shape_at(0);
        snapshot.add_shape(shape(1, 150.0, 50.0, 100.0, 320.0));

        assert_eq!(log.shape_count(), 1);
        assert_eq!(log.shapes()[0].id, 0);
        assert_eq!(snapshot.shape_count(), 1);
        assert_eq!(snapshot.shapes()[0].id, 1);
    }

    #[test]
    fn test_saw_dust_sum() {
        let mut log = Log::new(0, 560.0, 3.0);
        log.add_shape(shape(0, 100.0, 50.0, 200.0, 200.0));
        assert!((log.saw_dust() - 936.0).abs() < 1e-9);
    }
}
