//! # Sawmill ALNS
//!
//! The optimization engine for the sawmill log-packing problem: pack
//! rectangular boards from a demand catalog into circular log cross-sections,
//! maximizing used volume net of saw-kerf losses.
//!
//! The engine seeds each log with a greedy decomposition of the circle (a
//! central band, caps, corners and edge strips), then improves it with an
//! Adaptive Large Neighborhood Search: destroy operators free up space,
//! repair operators repack it through an integer-knapsack LP, tuck moves
//! close remaining slack, and operator selection adapts to observed success.
//! Only improving states are committed.
//!
//! ```no_run
//! use sawmill_alns::Optimizer;
//! use sawmill_core::{Catalog, Log, RunConfig, ShapeType};
//!
//! # fn main() -> sawmill_core::Result<()> {
//! let catalog = Catalog::new(vec![
//!     ShapeType::new(0, 100.0, 100.0).with_demand(5),
//!     ShapeType::new(0, 150.0, 50.0).with_demand(10),
//! ])
//! .with_transposed();
//! let logs = vec![Log::new(0, 560.0, 3.0), Log::new(1, 450.0, 3.0)];
//!
//! let mut optimizer = Optimizer::new(catalog, logs, RunConfig::default().with_seed(7));
//! let report = optimizer.run()?;
//! println!("{} boards placed", report.placements.len());
//! # Ok(())
//! # }
//! ```
//!
//! Shared types (logs, shapes, geometry, configuration, report rows) live in
//! the `sawmill-core` crate.

pub mod constructor;
pub mod destroy;
pub mod driver;
pub mod methods;
pub mod packer;
pub mod repair;
pub mod tuck;

pub use constructor::greedy_construct;
pub use driver::Optimizer;
pub use methods::{DestroyOp, MethodPool, RepairOp};
pub use packer::{pack_rectangle, Packing};
pub use tuck::TuckDirection;
