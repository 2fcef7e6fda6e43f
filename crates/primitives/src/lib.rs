//! Core types for list reconciliation: identities, item paths, and geometry.

/// Scroll-space geometry: points, sizes, rectangles, and axes.
pub mod geometry;
/// Identity traits and the stable/positional addressing keys.
pub mod ids;

pub use geometry::{Axis, Point, Rect, Size};
pub use ids::{Identifiable, Identity, IndexPath, ItemPath};
