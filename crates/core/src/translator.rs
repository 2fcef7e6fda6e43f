//! Bidirectional mapping between positional index paths and stable item paths.
//!
//! The map is rebuilt in full from each new snapshot in a single pass and is
//! read-only until the next rebuild. Only the cache is maintained
//! incrementally; at `O(n)` the translator is always cheap enough to rebuild.

use rustc_hash::FxHashMap;
use stacklist_primitives::{Identity, IndexPath, ItemPath};

use crate::snapshot::Snapshot;

/// Index path to item path translation for one snapshot.
///
/// With unique identities the two directions are mutual inverses. If a
/// section repeats an item identity, the reverse direction resolves to the
/// last occurrence.
#[derive(Debug, Clone)]
pub struct PositionMap<S, I> {
	paths: Vec<Vec<ItemPath<S, I>>>,
	indices: FxHashMap<ItemPath<S, I>, IndexPath>,
}

impl<S: Identity, I: Identity> PositionMap<S, I> {
	/// Returns an empty map.
	pub fn new() -> Self {
		Self {
			paths: Vec::new(),
			indices: FxHashMap::default(),
		}
	}

	/// Builds the map for `snapshot`.
	pub fn rebuild(snapshot: &Snapshot<S, I>) -> Self {
		let mut paths = Vec::with_capacity(snapshot.section_count());
		let mut indices = FxHashMap::with_capacity_and_hasher(snapshot.item_count(), Default::default());

		for (section_index, section) in snapshot.sections().iter().enumerate() {
			let mut row = Vec::with_capacity(section.len());
			for (item_index, item) in section.items().iter().enumerate() {
				let path = ItemPath::new(item.clone(), section.id().clone());
				indices.insert(path.clone(), IndexPath::new(section_index, item_index));
				row.push(path);
			}
			paths.push(row);
		}

		Self { paths, indices }
	}

	/// Resolves a positional query to a stable item path.
	pub fn item_path(&self, index_path: IndexPath) -> Option<&ItemPath<S, I>> {
		self.paths.get(index_path.section)?.get(index_path.item)
	}

	/// Resolves a stable item path to its current position.
	pub fn index_path(&self, item_path: &ItemPath<S, I>) -> Option<IndexPath> {
		self.indices.get(item_path).copied()
	}

	/// Returns true if `item_path` is present.
	pub fn contains(&self, item_path: &ItemPath<S, I>) -> bool {
		self.indices.contains_key(item_path)
	}

	/// Returns the number of sections.
	pub fn section_count(&self) -> usize {
		self.paths.len()
	}

	/// Returns the number of items in the section at `section`.
	pub fn item_count(&self, section: usize) -> usize {
		self.paths.get(section).map_or(0, Vec::len)
	}

	/// Returns the total number of positions.
	pub fn len(&self) -> usize {
		self.paths.iter().map(Vec::len).sum()
	}

	/// Returns true if no positions are mapped.
	pub fn is_empty(&self) -> bool {
		self.paths.iter().all(Vec::is_empty)
	}

	/// Iterates over `(index path, item path)` pairs in positional order.
	pub fn iter(&self) -> impl Iterator<Item = (IndexPath, &ItemPath<S, I>)> {
		self.paths.iter().enumerate().flat_map(|(section, row)| {
			row.iter()
				.enumerate()
				.map(move |(item, path)| (IndexPath::new(section, item), path))
		})
	}
}

impl<S: Identity, I: Identity> Default for PositionMap<S, I> {
	fn default() -> Self {
		Self::new()
	}
}
