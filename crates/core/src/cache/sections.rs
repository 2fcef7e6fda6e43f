use rustc_hash::{FxHashMap, FxHashSet};
use stacklist_primitives::{Identity, ItemPath};

/// Reverse index from section identity to the cached item paths in that section.
///
/// A path is tracked while it has an entry in either tier, which keeps
/// section-wide invalidation proportional to the section's own entries.
#[derive(Debug)]
pub(super) struct SectionIndex<S, I> {
	by_section: FxHashMap<S, FxHashSet<ItemPath<S, I>>>,
}

impl<S: Identity, I: Identity> SectionIndex<S, I> {
	pub(super) fn new() -> Self {
		Self {
			by_section: FxHashMap::default(),
		}
	}

	pub(super) fn track(&mut self, path: &ItemPath<S, I>) {
		self.by_section.entry(path.section.clone()).or_default().insert(path.clone());
	}

	pub(super) fn untrack(&mut self, path: &ItemPath<S, I>) {
		if let Some(paths) = self.by_section.get_mut(&path.section) {
			paths.remove(path);
			if paths.is_empty() {
				self.by_section.remove(&path.section);
			}
		}
	}

	/// Removes and returns every tracked path in `section`.
	pub(super) fn take(&mut self, section: &S) -> FxHashSet<ItemPath<S, I>> {
		self.by_section.remove(section).unwrap_or_default()
	}

	pub(super) fn section_len(&self, section: &S) -> usize {
		self.by_section.get(section).map_or(0, FxHashSet::len)
	}

	pub(super) fn path_count(&self) -> usize {
		self.by_section.values().map(FxHashSet::len).sum()
	}

	pub(super) fn section_count(&self) -> usize {
		self.by_section.len()
	}

	pub(super) fn clear(&mut self) {
		self.by_section.clear();
	}
}
