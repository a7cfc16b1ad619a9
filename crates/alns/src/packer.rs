//! LP packing adapter: fills a rectangular region with an optimal board mix.
//!
//! The region interior (shrunk by one kerf on all sides) is treated as a 1-D
//! strip capacity problem in two independent orientations: boards laid
//! left-to-right at a fixed height class (*Horizontal*), or bottom-to-top at
//! a fixed width class (*Vertical*). For every distinct class dimension an
//! integer knapsack is solved with HiGHS via `good_lp`:
//!
//! ```text
//! maximize   sum(count_i * width_i * height_i)
//! subject to sum(count_i * (dim_i + kerf)) <= capacity
//! ```
//!
//! The class/orientation with the highest relative usage wins and is
//! materialized as concrete shapes laid consecutively with kerf gaps.
//!
//! A solver failure is fatal ([`Error::SolverInfeasible`]): the model always
//! admits the empty solution, so non-optimal status indicates a modeling
//! bug. An empty result is not an error; callers treat it as a no-op.

use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, Solution, SolverModel,
    Variable,
};

use sawmill_core::error::{Error, Result};
use sawmill_core::geometry::{Rect, EPS};
use sawmill_core::shape::{IdGen, Shape, ShapeType};

/// Orientation of the winning strip assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Horizontal,
    Vertical,
}

/// Result of packing one rectangle.
#[derive(Debug, Clone, Default)]
pub struct Packing {
    /// Materialized boards, positioned inside the rectangle.
    pub shapes: Vec<Shape>,
    /// Area placed divided by the usable rectangle area.
    pub rel_usage: f64,
}

impl Packing {
    /// True when nothing could be placed.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Total board area placed.
    pub fn placed_area(&self) -> f64 {
        self.shapes.iter().map(Shape::area).sum()
    }
}

/// Solves one bounded integer knapsack over `members`, packing along the
/// axis selected by `orientation` into `capacity`.
///
/// Returns the chosen count per member.
fn solve_knapsack(
    members: &[&ShapeType],
    capacity: f64,
    kerf: f64,
    orientation: Orientation,
) -> Result<Vec<u32>> {
    let dim = |t: &ShapeType| match orientation {
        Orientation::Horizontal => t.width,
        Orientation::Vertical => t.height,
    };

    let mut vars = ProblemVariables::new();
    let counts: Vec<Variable> = members
        .iter()
        .map(|t| {
            let upper = (capacity / (dim(t) + kerf)).floor().max(0.0);
            vars.add(variable().integer().min(0).max(upper))
        })
        .collect();

    let objective = members
        .iter()
        .zip(&counts)
        .fold(Expression::from(0.0), |acc, (t, &v)| acc + t.area() * v);
    let used = members
        .iter()
        .zip(&counts)
        .fold(Expression::from(0.0), |acc, (t, &v)| {
            acc + (dim(t) + kerf) * v
        });

    let solution = vars
        .maximise(objective)
        .using(default_solver)
        .with(constraint!(used <= capacity))
        .solve()
        .map_err(|e| {
            Error::SolverInfeasible(format!(
                "knapsack over {} candidates, capacity {capacity:.2}: {e:?}",
                members.len()
            ))
        })?;

    Ok(counts
        .iter()
        .map(|&v| solution.value(v).round().max(0.0) as u32)
        .collect())
}

/// Fills `rect` with the best mix of `candidates`, respecting the saw kerf
/// on all sides and between boards.
///
/// The rectangle is expected to include the kerf margin: boards are placed
/// starting one kerf inside `rect` and never closer than one kerf to its far
/// edges. Returns an empty [`Packing`] when no candidate fits.
pub fn pack_rectangle(
    rect: &Rect,
    candidates: &[ShapeType],
    kerf: f64,
    ids: &mut IdGen,
) -> Result<Packing> {
    let width = rect.width() - 2.0 * kerf;
    let height = rect.height() - 2.0 * kerf;
    if width <= 0.0 || height <= 0.0 {
        return Ok(Packing::default());
    }

    let feasible: Vec<&ShapeType> = candidates
        .iter()
        .filter(|t| t.width <= width && t.height <= height)
        .collect();
    if feasible.is_empty() {
        return Ok(Packing::default());
    }

    let usable_area = width * height;
    let mut best: Option<(f64, Vec<(&ShapeType, u32)>, Orientation)> = None;

    for orientation in [Orientation::Horizontal, Orientation::Vertical] {
        let class_dim = |t: &ShapeType| match orientation {
            Orientation::Horizontal => t.height,
            Orientation::Vertical => t.width,
        };
        let capacity = match orientation {
            Orientation::Horizontal => width,
            Orientation::Vertical => height,
        };

        let mut class_dims: Vec<f64> = feasible.iter().map(|t| class_dim(t)).collect();
        class_dims.sort_by(f64::total_cmp);
        class_dims.dedup();

        for class in class_dims {
            let members: Vec<&ShapeType> = feasible
                .iter()
                .filter(|t| class_dim(t) <= class)
                .copied()
                .collect();
            if members.is_empty() {
                continue;
            }

            let counts = solve_knapsack(&members, capacity, kerf, orientation)?;
            let usage: f64 = members
                .iter()
                .zip(&counts)
                .map(|(t, &n)| t.area() * n as f64)
                .sum();
            let rel_usage = usage / usable_area;

            if best.as_ref().map_or(rel_usage > 0.0, |b| rel_usage > b.0) {
                let chosen = members
                    .into_iter()
                    .zip(counts)
                    .filter(|(_, n)| *n > 0)
                    .collect();
                best = Some((rel_usage, chosen, orientation));
            }
        }
    }

    let Some((rel_usage, chosen, orientation)) = best else {
        return Ok(Packing::default());
    };

    // Lay the chosen boards consecutively with kerf gaps from the low edge.
    let mut shapes = Vec::new();
    let mut z = match orientation {
        Orientation::Horizontal => rect.x_min + kerf,
        Orientation::Vertical => rect.y_min + kerf,
    };
    for (shape_type, count) in chosen {
        for _ in 0..count {
            let shape = match orientation {
                Orientation::Horizontal => {
                    Shape::new(ids.next_shape_id(), shape_type, z, rect.y_min + kerf)
                }
                Orientation::Vertical => {
                    Shape::new(ids.next_shape_id(), shape_type, rect.x_min + kerf, z)
                }
            };
            let (advance, edge, bound) = match orientation {
                Orientation::Horizontal => (shape_type.width, shape.x_max(), rect.x_max),
                Orientation::Vertical => (shape_type.height, shape.y_max(), rect.y_max),
            };
            if edge + kerf > bound + EPS {
                return Err(Error::InvariantViolation(format!(
                    "packing exceeds rectangle bound: edge {edge:.4} + kerf > {bound:.4}"
                )));
            }
            log::debug!(
                "packed shape type {} ({}x{}) at ({:.2}, {:.2})",
                shape_type.id,
                shape_type.width,
                shape_type.height,
                shape.x,
                shape.y
            );
            shapes.push(shape);
            z += advance + kerf;
        }
    }

    Ok(Packing { shapes, rel_usage })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sawmill_core::geometry::shapes_intersect;

    fn types(entries: &[(f64, f64)]) -> Vec<ShapeType> {
        entries
            .iter()
            .enumerate()
            .map(|(i, &(w, h))| ShapeType::new(i, w, h))
            .collect()
    }

    #[test]
    fn test_pack_empty_when_nothing_fits() {
        let mut ids = IdGen::new();
        let rect = Rect::new(0.0, 50.0, 0.0, 50.0);
        let catalog = types(&[(100.0, 100.0)]);
        let packing = pack_rectangle(&rect, &catalog, 3.0, &mut ids).unwrap();
        assert!(packing.is_empty());
        assert_eq!(packing.rel_usage, 0.0);
    }

    #[test]
    fn test_pack_degenerate_rect() {
        let mut ids = IdGen::new();
        let rect = Rect::new(0.0, 5.0, 0.0, 200.0);
        let catalog = types(&[(10.0, 10.0)]);
        let packing = pack_rectangle(&rect, &catalog, 3.0, &mut ids).unwrap();
        assert!(packing.is_empty());
    }

    #[test]
    fn test_pack_single_type_row() {
        let mut ids = IdGen::new();
        // Usable width 406 - 2*3 = 400; each 100-wide board costs 103.
        let rect = Rect::new(0.0, 406.0, 0.0, 106.0);
        let catalog = types(&[(100.0, 100.0)]);
        let packing = pack_rectangle(&rect, &catalog, 3.0, &mut ids).unwrap();
        assert_eq!(packing.shapes.len(), 3);

        // Capacity property: total (width + kerf) within usable width.
        let consumed: f64 = packing.shapes.iter().map(|s| s.width + 3.0).sum();
        assert!(consumed <= 400.0 + EPS);

        // All inside the rectangle with kerf margin.
        for s in &packing.shapes {
            assert!(s.x >= rect.x_min + 3.0 - EPS);
            assert!(s.x_max() <= rect.x_max - 3.0 + EPS);
            assert!(s.y >= rect.y_min + 3.0 - EPS);
            assert!(s.y_max() <= rect.y_max - 3.0 + EPS);
        }

        // Pairwise kerf separation.
        for (i, a) in packing.shapes.iter().enumerate() {
            for b in &packing.shapes[i + 1..] {
                assert!(!shapes_intersect(a, b, 3.0));
            }
        }
    }

    #[test]
    fn test_pack_prefers_denser_mix() {
        let mut ids = IdGen::new();
        // 150x50 boards tile this short strip much better than 100x100.
        let rect = Rect::new(0.0, 312.0, 0.0, 56.0);
        let catalog = types(&[(100.0, 100.0), (150.0, 50.0)]);
        let packing = pack_rectangle(&rect, &catalog, 3.0, &mut ids).unwrap();
        assert!(!packing.is_empty());
        assert!(packing.shapes.iter().all(|s| s.height == 50.0));
        assert_eq!(packing.shapes.len(), 2);
    }

    #[test]
    fn test_pack_vertical_orientation() {
        let mut ids = IdGen::new();
        // Tall, narrow region: only vertical stacking works for 150x50
        // rotated... the 50x150 candidate stacks bottom-to-top.
        let rect = Rect::new(0.0, 56.0, 0.0, 312.0);
        let catalog = types(&[(50.0, 150.0)]);
        let packing = pack_rectangle(&rect, &catalog, 3.0, &mut ids).unwrap();
        assert_eq!(packing.shapes.len(), 2);
        let ys: Vec<f64> = packing.shapes.iter().map(|s| s.y).collect();
        assert!((ys[1] - ys[0]).abs() >= 150.0 + 3.0 - EPS);
    }

    #[test]
    fn test_rel_usage_bounds() {
        let mut ids = IdGen::new();
        let rect = Rect::new(0.0, 412.0, 0.0, 112.0);
        let catalog = types(&[(100.0, 100.0), (150.0, 50.0)]);
        let packing = pack_rectangle(&rect, &catalog, 3.0, &mut ids).unwrap();
        assert!(packing.rel_usage > 0.0);
        assert!(packing.rel_usage <= 1.0 + EPS);
        let usable = (412.0 - 6.0) * (112.0 - 6.0);
        assert!((packing.placed_area() / usable - packing.rel_usage).abs() < 1e-6);
    }
}
