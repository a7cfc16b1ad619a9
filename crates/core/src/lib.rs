//! # Sawmill Core
//!
//! Shared types and the geometric kernel for the sawmill log-packing engine.
//!
//! The engine packs rectangular boards ([`Shape`]) from a demand catalog
//! ([`ShapeType`], [`Catalog`]) into circular log cross-sections ([`Log`]),
//! keeping one saw kerf of material between any two boards and between every
//! board and the circle boundary.
//!
//! ## Components
//!
//! - **Data model**: [`ShapeType`], [`Catalog`], [`Shape`], [`Log`], [`IdGen`]
//! - **Geometry kernel**: chord queries, kerf-aware intersection and
//!   clearance queries in [`geometry`]
//! - **Configuration**: [`RunConfig`], [`ScoreWeights`]
//! - **Reporting**: [`RunReport`] and its row types
//!
//! The optimization engine itself (LP packing, greedy construction, ALNS
//! operators and driver) lives in the `sawmill-alns` crate.
//!
//! ## Feature Flags
//!
//! - `serde`: serialization support for config, model and report types

pub mod config;
pub mod error;
pub mod geometry;
pub mod log;
pub mod metrics;
pub mod shape;

// Re-exports
pub use config::{RunConfig, ScoreWeights};
pub use error::{Error, Result};
pub use geometry::{ClampPriority, Direction, Rect, EPS};
pub use crate::log::Log;
pub use metrics::{IterationRecord, MethodRecord, PlacementRecord, RunReport};
pub use shape::{Catalog, IdGen, Shape, ShapeType};
