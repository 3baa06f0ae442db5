//! Keyline terrain analysis.
//!
//! Turns a sampled elevation surface into water-management geometry:
//! keypoints (convex→concave slope inflections), keylines (contour-following
//! polylines through them), and candidate pond sites, plus summary
//! statistics. Five sequential stages: differential field → flow routing →
//! keypoint detection → keyline tracing → pond site selection.
//!
//! The engine is pure and synchronous: it performs no I/O, owns no caches,
//! and produces a bit-identical result for identical input. Elevation
//! sampling, persistence, and rendering are the caller's business.

pub mod analysis;
pub mod differential;
pub mod features;
pub mod flow;
pub mod grid;
pub mod keyline;
pub mod keypoint;
pub mod params;
pub mod pond;

pub use analysis::{analyze, AnalysisInput, AnalysisResult, AnalysisStats};
pub use differential::{compute_differentials, CellDifferential, DifferentialField};
pub use features::{Feature, FeatureCollection, Geometry};
pub use flow::{compute_flow_accumulation, FlowAccumulation};
pub use grid::{Bounds, ElevationGrid, GridError};
pub use keyline::{trace_keylines, Keyline};
pub use keypoint::{detect_keypoints, Keypoint};
pub use params::{KeylineSpacing, RainfallContext, WaterStrategy};
pub use pond::{select_pond_sites, PondSite};
