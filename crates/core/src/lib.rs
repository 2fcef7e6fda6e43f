//! Identity-keyed incremental reconciliation for sectioned, virtualized lists.
//!
//! A [`Driver`] sits between a sectioned data model and a positional rendering
//! surface. Each cycle it:
//!
//! 1. takes the latest [`Snapshot`] (bursts of updates collapse into one),
//! 2. diffs it against the last applied snapshot into an [`EditScript`],
//! 3. invalidates the [`ListCache`] entries the script removed or changed,
//! 4. rebuilds the index-path/item-path [`PositionMap`],
//! 5. hands the script to the [`RenderSurface`] while keeping the user's
//!    visual scroll anchor in place.
//!
//! The cache is keyed by [`ItemPath`] (item identity plus section identity),
//! never by position, so cached measurements and materialized content survive
//! pure reordering.

/// Two-tier item cache keyed by stable identity.
pub mod cache;
/// Runtime configuration.
pub mod config;
/// Snapshot-level diffing into edit scripts.
pub mod diff;
/// Generic identity-sequence difference.
pub mod difference;
/// The reconciliation cycle.
pub mod driver;
/// Error and recovered-violation types.
pub mod error;
/// Reconciliation counters.
pub mod metrics;
/// Immutable sectioned snapshots.
pub mod snapshot;
/// Collaborator interfaces: data sources, content providers, rendering surfaces.
pub mod surface;
/// Bidirectional index-path/item-path translation.
pub mod translator;

pub use cache::{CacheStats, ItemMetrics, ListCache, MeasureScope};
pub use config::{FallbackPolicy, ListConfig};
pub use diff::{EditScript, ItemChanges, SectionEdit, SectionReset};
pub use difference::{Difference, Insertion, Removal};
pub use driver::{ApplySummary, CyclePhase, Driver, ReconcileOutcome};
pub use error::{ConfigError, ScriptViolation};
pub use metrics::ReconcileMetrics;
pub use snapshot::{SectionSnapshot, Snapshot, SnapshotBuilder, SnapshotId};
pub use stacklist_primitives::{Axis, Identifiable, Identity, IndexPath, ItemPath, Point, Rect, Size};
pub use surface::{ContentProvider, ListDataSource, RenderSurface, SurfaceUpdate};
pub use translator::PositionMap;
