//! Two-tier item cache keyed by stable [`ItemPath`] rather than position.
//!
//! - The cheap tier holds small, frequently recomputed facts (last measured
//!   size). Entries are dropped the instant their path is invalidated.
//! - The expensive tier holds costly artifacts (materialized row content) in a
//!   bounded LRU, so scrolling away and back does not immediately lose them
//!   while growth stays capped.
//!
//! Both tiers share a reverse index from section identity to cached paths so
//! that removing a section costs time proportional to that section alone.
//! The cache also owns the current [`PositionMap`], which is how positional
//! queries from the rendering surface reach identity-keyed entries.

mod scope;
mod sections;

use std::fmt;
use std::num::NonZeroUsize;

use lru::LruCache;
use rustc_hash::{FxBuildHasher, FxHashMap};
use stacklist_primitives::{Identity, IndexPath, ItemPath, Size};
use tracing::{debug, trace};

pub use scope::MeasureScope;
use sections::SectionIndex;

use crate::config::ListConfig;
use crate::error::Result;
use crate::translator::PositionMap;

/// Default cheap-tier entry: per-item layout facts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ItemMetrics {
	/// Size observed the last time the item was rendered.
	pub measured_size: Option<Size>,
}

impl ItemMetrics {
	/// Stores a new measurement, returning true if it changed.
	pub fn record(&mut self, size: Size) -> bool {
		let changed = self.measured_size != Some(size);
		self.measured_size = Some(size);
		changed
	}
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
	/// Entries in the cheap tier.
	pub cheap_entries: usize,
	/// Entries in the expensive tier.
	pub expensive_entries: usize,
	/// Sections with at least one cached entry.
	pub tracked_sections: usize,
	/// Expensive entries dropped for capacity since creation.
	pub evictions: u64,
	/// Item paths dropped by invalidation since creation.
	pub invalidations: u64,
}

/// Identity-keyed cache for one list instance.
pub struct ListCache<S, I, E, C = ItemMetrics> {
	cheap: FxHashMap<ItemPath<S, I>, C>,
	expensive: LruCache<ItemPath<S, I>, E, FxBuildHasher>,
	sections: SectionIndex<S, I>,
	positions: PositionMap<S, I>,
	evictions: u64,
	invalidations: u64,
}

impl<S: Identity, I: Identity, E, C> ListCache<S, I, E, C> {
	/// Creates an empty cache whose expensive tier holds at most `capacity` entries.
	pub fn new(capacity: NonZeroUsize) -> Self {
		Self {
			cheap: FxHashMap::default(),
			expensive: LruCache::with_hasher(capacity, FxBuildHasher),
			sections: SectionIndex::new(),
			positions: PositionMap::new(),
			evictions: 0,
			invalidations: 0,
		}
	}

	/// Creates an empty cache sized from `config`.
	pub fn from_config(config: &ListConfig) -> Result<Self> {
		Ok(Self::new(config.expensive_capacity_nonzero()?))
	}

	/// Returns the cheap entry for `path`, creating it on first access.
	///
	/// Repeated calls without an intervening invalidation return the same
	/// entry, so callers can accumulate state in place.
	pub fn cheap(&mut self, path: &ItemPath<S, I>) -> &mut C
	where
		C: Default,
	{
		cheap_entry(&mut self.cheap, &mut self.sections, path)
	}

	/// Returns the cheap entry for `path` without creating it.
	pub fn peek_cheap(&self, path: &ItemPath<S, I>) -> Option<&C> {
		self.cheap.get(path)
	}

	/// Returns the expensive entry for `path`, creating a default one on a miss.
	pub fn expensive(&mut self, path: &ItemPath<S, I>) -> &mut E
	where
		E: Default,
	{
		self.expensive_with(path, E::default)
	}

	/// Returns the expensive entry for `path`, building it with `make` on a miss.
	///
	/// Either way the entry becomes the most recently used. Inserting into a
	/// full tier evicts the least recently used entry first.
	pub fn expensive_with(&mut self, path: &ItemPath<S, I>, make: impl FnOnce() -> E) -> &mut E {
		if !self.expensive.contains(path) {
			if self.expensive.len() >= self.expensive.cap().get()
				&& let Some((evicted, _)) = self.expensive.pop_lru()
			{
				self.note_eviction(&evicted);
			}
			self.sections.track(path);
		}
		self.expensive.get_or_insert_mut(path.clone(), make)
	}

	/// Stores `value` as the expensive entry for `path`, marking it most recently used.
	pub fn set_expensive(&mut self, path: &ItemPath<S, I>, value: E) {
		match self.expensive.get_mut(path) {
			Some(slot) => *slot = value,
			None => {
				self.expensive_with(path, move || value);
			}
		}
	}

	/// Returns the expensive entry for `path` without touching its recency.
	pub fn peek_expensive(&self, path: &ItemPath<S, I>) -> Option<&E> {
		self.expensive.peek(path)
	}

	/// Returns the cheap entry at `index_path` in the current snapshot.
	pub fn cheap_at(&mut self, index_path: IndexPath) -> Option<&mut C>
	where
		C: Default,
	{
		let path = self.positions.item_path(index_path)?;
		Some(cheap_entry(&mut self.cheap, &mut self.sections, path))
	}

	/// Returns the expensive entry at `index_path`, building it with `make` on a miss.
	pub fn expensive_at_with(&mut self, index_path: IndexPath, make: impl FnOnce(&ItemPath<S, I>) -> E) -> Option<&mut E> {
		let path = self.positions.item_path(index_path)?.clone();
		Some(self.expensive_with(&path, || make(&path)))
	}

	/// Drops both tiers' entries for `path`. Returns true if anything was removed.
	pub fn invalidate(&mut self, path: &ItemPath<S, I>) -> bool {
		let removed = self.cheap.remove(path).is_some() | self.expensive.pop(path).is_some();
		if removed {
			self.sections.untrack(path);
			self.invalidations += 1;
			trace!(?path, "cache.invalidate");
		}
		removed
	}

	/// Drops only the cheap entry for `path`, keeping any expensive artifact.
	pub fn invalidate_cheap(&mut self, path: &ItemPath<S, I>) -> bool {
		let removed = self.cheap.remove(path).is_some();
		if removed && !self.expensive.contains(path) {
			self.sections.untrack(path);
		}
		removed
	}

	/// Drops every entry whose path lies in `section`. Returns the number of paths removed.
	pub fn invalidate_section(&mut self, section: &S) -> usize {
		let paths = self.sections.take(section);
		for path in &paths {
			self.cheap.remove(path);
			self.expensive.pop(path);
		}
		self.invalidations += paths.len() as u64;
		if !paths.is_empty() {
			trace!(?section, removed = paths.len(), "cache.invalidate_section");
		}
		paths.len()
	}

	/// Clears both tiers and the translation table.
	pub fn invalidate_all(&mut self) {
		self.invalidations += self.sections.path_count() as u64;
		self.cheap.clear();
		self.expensive.clear();
		self.sections.clear();
		self.positions = PositionMap::new();
	}

	/// Returns the current translation table.
	pub fn positions(&self) -> &PositionMap<S, I> {
		&self.positions
	}

	/// Installs the translation table for a newly applied snapshot.
	pub(crate) fn replace_positions(&mut self, positions: PositionMap<S, I>) -> PositionMap<S, I> {
		std::mem::replace(&mut self.positions, positions)
	}

	/// Returns a cheap-tier-only view for measurement callbacks.
	pub fn measure_scope(&mut self) -> MeasureScope<'_, S, I, C> {
		MeasureScope {
			cheap: &mut self.cheap,
			sections: &mut self.sections,
			positions: &self.positions,
		}
	}

	/// Returns the expensive-tier capacity.
	pub fn expensive_capacity(&self) -> NonZeroUsize {
		self.expensive.cap()
	}

	/// Changes the expensive-tier capacity, evicting LRU entries when shrinking.
	pub fn set_expensive_capacity(&mut self, capacity: NonZeroUsize) {
		while self.expensive.len() > capacity.get() {
			let Some((evicted, _)) = self.expensive.pop_lru() else {
				break;
			};
			self.note_eviction(&evicted);
		}
		self.expensive.resize(capacity);
	}

	/// Returns true if the expensive tier holds an entry for `path`.
	pub fn contains_expensive(&self, path: &ItemPath<S, I>) -> bool {
		self.expensive.contains(path)
	}

	/// Returns the number of cached paths in `section` across both tiers.
	pub fn section_entries(&self, section: &S) -> usize {
		self.sections.section_len(section)
	}

	/// Returns current counters.
	pub fn stats(&self) -> CacheStats {
		CacheStats {
			cheap_entries: self.cheap.len(),
			expensive_entries: self.expensive.len(),
			tracked_sections: self.sections.section_count(),
			evictions: self.evictions,
			invalidations: self.invalidations,
		}
	}

	fn note_eviction(&mut self, path: &ItemPath<S, I>) {
		self.evictions += 1;
		if !self.cheap.contains_key(path) {
			self.sections.untrack(path);
		}
		debug!(?path, evictions = self.evictions, "cache.evict");
	}
}

impl<S: Identity, I: Identity, E, C> fmt::Debug for ListCache<S, I, E, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ListCache")
			.field("cheap", &self.cheap.len())
			.field("expensive", &self.expensive.len())
			.field("capacity", &self.expensive.cap())
			.field("evictions", &self.evictions)
			.field("invalidations", &self.invalidations)
			.finish()
	}
}

/// Get-or-insert on the cheap tier, keeping the section index in step.
fn cheap_entry<'c, S: Identity, I: Identity, C: Default>(
	cheap: &'c mut FxHashMap<ItemPath<S, I>, C>,
	sections: &mut SectionIndex<S, I>,
	path: &ItemPath<S, I>,
) -> &'c mut C {
	if !cheap.contains_key(path) {
		sections.track(path);
	}
	cheap.entry(path.clone()).or_default()
}
