use rustc_hash::FxHashMap;
use stacklist_primitives::{Identity, IndexPath, ItemPath, Size};

use super::sections::SectionIndex;
use super::{ItemMetrics, cheap_entry};
use crate::translator::PositionMap;

/// Cheap-tier view handed to the rendering surface while an update is applied.
///
/// Measurement callbacks nested inside the apply step may read and write
/// per-item facts by index path, but cannot reach the expensive tier, the
/// translator, or the driver.
pub struct MeasureScope<'a, S, I, C> {
	pub(super) cheap: &'a mut FxHashMap<ItemPath<S, I>, C>,
	pub(super) sections: &'a mut SectionIndex<S, I>,
	pub(super) positions: &'a PositionMap<S, I>,
}

impl<S: Identity, I: Identity, C: Default> MeasureScope<'_, S, I, C> {
	/// Resolves an index path against the snapshot being applied.
	pub fn item_path(&self, index_path: IndexPath) -> Option<&ItemPath<S, I>> {
		self.positions.item_path(index_path)
	}

	/// Returns the cheap entry at `index_path`, creating it on first access.
	pub fn entry(&mut self, index_path: IndexPath) -> Option<&mut C> {
		let positions = self.positions;
		let path = positions.item_path(index_path)?;
		Some(cheap_entry(self.cheap, self.sections, path))
	}

	/// Returns the cheap entry at `index_path` without creating it.
	pub fn peek(&self, index_path: IndexPath) -> Option<&C> {
		self.cheap.get(self.positions.item_path(index_path)?)
	}
}

impl<S: Identity, I: Identity> MeasureScope<'_, S, I, ItemMetrics> {
	/// Records the rendered size of the item at `index_path`.
	///
	/// Returns true if the size differs from the previous measurement.
	pub fn record_size(&mut self, index_path: IndexPath, size: Size) -> bool {
		self.entry(index_path).is_some_and(|metrics| metrics.record(size))
	}

	/// Returns the last measured size of the item at `index_path`.
	pub fn measured_size(&self, index_path: IndexPath) -> Option<Size> {
		self.peek(index_path).and_then(|metrics| metrics.measured_size)
	}
}
