//! Reconciliation counters.
//!
//! The driver is single-threaded, so these are plain integers rather than
//! atomics. Read them through [`crate::Driver::metrics`].

/// Counters accumulated over a driver's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileMetrics {
	/// Reconcile calls that found a pending snapshot.
	pub cycles: u64,
	/// Snapshot pairs actually diffed. Initial loads and identical skips are not counted.
	pub diffs_computed: u64,
	/// Cycles short-circuited because the new snapshot matched the applied one.
	pub identical_skips: u64,
	/// Pending snapshots replaced by a newer one before they were reconciled.
	pub coalesced_updates: u64,
	/// Sections whose item script was replaced by a reset.
	pub section_resets: u64,
	/// Cycles that fell back to reloading the whole surface.
	pub full_reloads: u64,
	/// Cycles in which the scroll offset was adjusted to hold the anchor.
	pub scroll_corrections: u64,
}

impl ReconcileMetrics {
	/// Creates zeroed counters.
	pub fn new() -> Self {
		Self::default()
	}
}
