//! Board catalog entries and placed board instances.
//!
//! A [`ShapeType`] is an immutable catalog entry (a board size the mill can
//! produce); a [`Shape`] is one placed instance of a type inside a log.
//! Shapes are plain values owned by their log, identified by ids handed out
//! by an explicit [`IdGen`] owned by the run session.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A board size from the demand catalog.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeType {
    /// Catalog index, unique per run.
    pub id: usize,
    /// Board width in millimeters.
    pub width: f64,
    /// Board height in millimeters.
    pub height: f64,
    /// Minimum demanded quantity, if the order specifies one.
    pub demand: Option<u32>,
    /// Display colour for external plotting collaborators.
    pub colour: Option<String>,
    /// For a transposed duplicate, the id of the type it was rotated from.
    pub duplicate_of: Option<usize>,
}

impl ShapeType {
    /// Creates a catalog entry. Ids are normally assigned by [`Catalog`].
    pub fn new(id: usize, width: f64, height: f64) -> Self {
        Self {
            id,
            width,
            height,
            demand: None,
            colour: None,
            duplicate_of: None,
        }
    }

    /// Sets the demanded quantity.
    pub fn with_demand(mut self, demand: u32) -> Self {
        self.demand = Some(demand);
        self
    }

    /// Sets the display colour.
    pub fn with_colour(mut self, colour: impl Into<String>) -> Self {
        self.colour = Some(colour.into());
        self
    }

    /// Board face area.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// The read-only catalog of board types shared by all optimization code.
///
/// Caches the smallest dimensions, which operators use as probe steps and
/// fit lower bounds.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Catalog {
    types: Vec<ShapeType>,
    min_width: f64,
    min_height: f64,
}

impl Catalog {
    /// Builds a catalog, reassigning ids in insertion order.
    pub fn new(entries: impl IntoIterator<Item = ShapeType>) -> Self {
        let mut types: Vec<ShapeType> = entries.into_iter().collect();
        for (i, t) in types.iter_mut().enumerate() {
            t.id = i;
        }
        let mut catalog = Self {
            types,
            min_width: f64::INFINITY,
            min_height: f64::INFINITY,
        };
        catalog.recompute_minimums();
        catalog
    }

    /// Appends a transposed duplicate for every non-square type, so the
    /// packer can use both board orientations. Duplicates record the type
    /// they were rotated from for demand accounting.
    pub fn with_transposed(mut self) -> Self {
        let mut rotated = Vec::new();
        let mut next_id = self.types.len();
        for t in &self.types {
            if (t.width - t.height).abs() > f64::EPSILON && t.duplicate_of.is_none() {
                let mut dup = ShapeType::new(next_id, t.height, t.width);
                dup.demand = t.demand;
                dup.colour = t.colour.clone();
                dup.duplicate_of = Some(t.id);
                rotated.push(dup);
                next_id += 1;
            }
        }
        self.types.extend(rotated);
        self.recompute_minimums();
        self
    }

    fn recompute_minimums(&mut self) {
        self.min_width = self
            .types
            .iter()
            .map(|t| t.width)
            .fold(f64::INFINITY, f64::min);
        self.min_height = self
            .types
            .iter()
            .map(|t| t.height)
            .fold(f64::INFINITY, f64::min);
    }

    /// All catalog types.
    pub fn types(&self) -> &[ShapeType] {
        &self.types
    }

    /// Looks up a type by id.
    pub fn get(&self, id: usize) -> Option<&ShapeType> {
        self.types.get(id)
    }

    /// Number of catalog entries (including transposed duplicates).
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True if the catalog holds no types.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Smallest width over all types.
    pub fn min_width(&self) -> f64 {
        self.min_width
    }

    /// Smallest height over all types.
    pub fn min_height(&self) -> f64 {
        self.min_height
    }

    /// Smallest single dimension over all types, used as a probe grid step.
    pub fn min_dimension(&self) -> f64 {
        self.min_width.min(self.min_height)
    }
}

/// Allocates shape ids for one run session.
///
/// Replaces module-level mutable counters: the allocator is owned by the
/// optimizer and passed where needed.
#[derive(Debug, Clone, Default)]
pub struct IdGen {
    next_shape: u64,
}

impl IdGen {
    /// Creates an allocator starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next shape id.
    pub fn next_shape_id(&mut self) -> u64 {
        let id = self.next_shape;
        self.next_shape += 1;
        id
    }
}

/// A placed board: one instance of a [`ShapeType`] at a position inside a log.
///
/// `(x, y)` is the lower-left corner. The shape is a value owned by its log;
/// there is no back-reference, containment queries go through the log.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Shape {
    /// Instance id, unique per run.
    pub id: u64,
    /// Id of the catalog type this shape instantiates.
    pub type_id: usize,
    /// Width, copied from the type.
    pub width: f64,
    /// Height, copied from the type.
    pub height: f64,
    /// X coordinate of the lower-left corner.
    pub x: f64,
    /// Y coordinate of the lower-left corner.
    pub y: f64,
}

impl Shape {
    /// Creates a placed instance of `shape_type` at `(x, y)`.
    pub fn new(id: u64, shape_type: &ShapeType, x: f64, y: f64) -> Self {
        Self {
            id,
            type_id: shape_type.id,
            width: shape_type.width,
            height: shape_type.height,
            x,
            y,
        }
    }

    /// Face area of the board.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Right edge x coordinate.
    pub fn x_max(&self) -> f64 {
        self.x + self.width
    }

    /// Top edge y coordinate.
    pub fn y_max(&self) -> f64 {
        self.y + self.height
    }

    /// Center of the board.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True if `(x, y)` lies within the kerf-expanded rectangle. The kerf is
    /// a deliberate tolerance so boundary-adjacent probes register as
    /// occupied.
    pub fn contains_point(&self, x: f64, y: f64, kerf: f64) -> bool {
        x >= self.x - kerf
            && x <= self.x_max() + kerf
            && y >= self.y - kerf
            && y <= self.y_max() + kerf
    }

    /// Material lost to the blade around this board: the kerf annulus area.
    pub fn kerf_area(&self, kerf: f64) -> f64 {
        (self.width + 2.0 * kerf) * (self.height + 2.0 * kerf) - self.area()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_assigns_ids_and_minimums() {
        let catalog = Catalog::new(vec![
            ShapeType::new(0, 100.0, 100.0),
            ShapeType::new(0, 150.0, 50.0),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.types()[1].id, 1);
        assert_eq!(catalog.min_width(), 100.0);
        assert_eq!(catalog.min_height(), 50.0);
        assert_eq!(catalog.min_dimension(), 50.0);
    }

    #[test]
    fn test_catalog_transposed_duplicates() {
        let catalog = Catalog::new(vec![
            ShapeType::new(0, 100.0, 100.0),
            ShapeType::new(0, 150.0, 50.0).with_demand(10),
        ])
        .with_transposed();

        // Square type is not duplicated, the 150x50 is.
        assert_eq!(catalog.len(), 3);
        let dup = &catalog.types()[2];
        assert_eq!(dup.width, 50.0);
        assert_eq!(dup.height, 150.0);
        assert_eq!(dup.duplicate_of, Some(1));
        assert_eq!(dup.demand, Some(10));
        assert_eq!(catalog.min_width(), 50.0);
    }

    #[test]
    fn test_shape_point_containment_includes_kerf() {
        let t = ShapeType::new(0, 100.0, 50.0);
        let shape = Shape::new(0, &t, 10.0, 20.0);

        assert!(shape.contains_point(10.0, 20.0, 0.0));
        assert!(shape.contains_point(110.0, 70.0, 0.0));
        assert!(!shape.contains_point(112.0, 70.0, 0.0));
        // Kerf widens the occupied footprint.
        assert!(shape.contains_point(112.0, 70.0, 3.0));
        assert!(!shape.contains_point(114.0, 70.0, 3.0));
    }

    #[test]
    fn test_id_gen_is_sequential() {
        let mut ids = IdGen::new();
        assert_eq!(ids.next_shape_id(), 0);
        assert_eq!(ids.next_shape_id(), 1);
        assert_eq!(ids.next_shape_id(), 2);
    }

    #[test]
    fn test_kerf_area() {
        let t = ShapeType::new(0, 100.0, 50.0);
        let shape = Shape::new(0, &t, 0.0, 0.0);
        // (106 * 56) - (100 * 50) = 5936 - 5000
        assert!((shape.kerf_area(3.0) - 936.0).abs() < 1e-9);
    }
}
