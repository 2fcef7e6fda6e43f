//! Immutable, ordered `(section, items)` snapshots of a list's data model.
//!
//! A snapshot records only identities (plus optional content revisions), in
//! the order the data source supplied them. Its [`SnapshotId`] is a hash over
//! the full nested structure, so two snapshots with equal ids can usually skip
//! reconciliation altogether; [`Snapshot::is_interchangeable`] confirms with a
//! structural comparison.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use stacklist_primitives::{Identifiable, Identity, ItemPath};

/// Content-derived identity of a whole snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotId(pub u64);

/// One section of a snapshot: its identity and ordered item identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSnapshot<S, I> {
	id: S,
	items: Vec<I>,
	/// Either empty (revisions not tracked) or parallel to `items`.
	revisions: Vec<u64>,
}

impl<S: Identity, I: Identity> SectionSnapshot<S, I> {
	/// Returns the section identity.
	pub fn id(&self) -> &S {
		&self.id
	}

	/// Returns the ordered item identities.
	pub fn items(&self) -> &[I] {
		&self.items
	}

	/// Returns the number of items.
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Returns true if the section holds no items.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Returns the content revision of the item at `offset`, if revisions are tracked.
	pub fn revision(&self, offset: usize) -> Option<u64> {
		self.revisions.get(offset).copied()
	}

	/// Returns true if this section carries per-item content revisions.
	pub fn tracks_revisions(&self) -> bool {
		!self.revisions.is_empty()
	}

	/// Returns the item path of the item at `offset`.
	pub fn item_path(&self, offset: usize) -> Option<ItemPath<S, I>> {
		self.items.get(offset).map(|item| ItemPath::new(item.clone(), self.id.clone()))
	}
}

/// An immutable, ordered sequence of sections and their items.
#[derive(Debug, Clone)]
pub struct Snapshot<S, I> {
	sections: Vec<SectionSnapshot<S, I>>,
	item_count: usize,
	id: SnapshotId,
}

impl<S: Identity, I: Identity> Snapshot<S, I> {
	/// Returns a snapshot with no sections.
	pub fn empty() -> Self {
		SnapshotBuilder::new().build()
	}

	/// Returns a builder for assembling a snapshot section by section.
	pub fn builder() -> SnapshotBuilder<S, I> {
		SnapshotBuilder::new()
	}

	/// Builds a snapshot from an external sectioned collection using identity accessors.
	///
	/// Order is preserved for both sections and items. Runs in time linear in
	/// the total item count.
	pub fn build<SM, IM, Items, FS, FI>(source: impl IntoIterator<Item = (SM, Items)>, section_id: FS, item_id: FI) -> Self
	where
		Items: IntoIterator<Item = IM>,
		FS: Fn(&SM) -> S,
		FI: Fn(&IM) -> I,
	{
		let mut builder = SnapshotBuilder::new();
		for (section, items) in source {
			builder.section(section_id(&section), items.into_iter().map(|item| item_id(&item)));
		}
		builder.build()
	}

	/// Builds a snapshot from models that carry their own identities.
	pub fn from_identifiable<'a, SM, IM, Items>(source: impl IntoIterator<Item = (&'a SM, Items)>) -> Self
	where
		SM: Identifiable<Id = S> + 'a,
		IM: Identifiable<Id = I> + 'a,
		Items: IntoIterator<Item = &'a IM>,
	{
		Self::build(source, |section: &&SM| section.id(), |item: &&IM| item.id())
	}

	/// Returns the content-derived identity of this snapshot.
	pub fn id(&self) -> SnapshotId {
		self.id
	}

	/// Returns the sections in order.
	pub fn sections(&self) -> &[SectionSnapshot<S, I>] {
		&self.sections
	}

	/// Returns the section identities in order.
	pub fn section_ids(&self) -> Vec<S> {
		self.sections.iter().map(|s| s.id.clone()).collect()
	}

	/// Returns the section at `index`.
	pub fn section(&self, index: usize) -> Option<&SectionSnapshot<S, I>> {
		self.sections.get(index)
	}

	/// Returns the number of sections.
	pub fn section_count(&self) -> usize {
		self.sections.len()
	}

	/// Returns the total number of items across all sections.
	pub fn item_count(&self) -> usize {
		self.item_count
	}

	/// Returns true if the snapshot has no sections.
	pub fn is_empty(&self) -> bool {
		self.sections.is_empty()
	}

	/// Iterates over every item path in snapshot order.
	pub fn item_paths(&self) -> impl Iterator<Item = ItemPath<S, I>> + '_ {
		self.sections
			.iter()
			.flat_map(|section| section.items.iter().map(move |item| ItemPath::new(item.clone(), section.id.clone())))
	}

	/// Returns true if reconciling from `other` to `self` would be a no-op.
	///
	/// Compares ids first and falls back to structure only on a hash match.
	pub fn is_interchangeable(&self, other: &Self) -> bool {
		self.id == other.id && self.item_count == other.item_count && self.sections == other.sections
	}
}

impl<S: Identity, I: Identity> Default for Snapshot<S, I> {
	fn default() -> Self {
		Self::empty()
	}
}

/// Incremental constructor for [`Snapshot`].
#[derive(Debug)]
pub struct SnapshotBuilder<S, I> {
	sections: Vec<SectionSnapshot<S, I>>,
	item_count: usize,
}

impl<S: Identity, I: Identity> SnapshotBuilder<S, I> {
	/// Creates an empty builder.
	pub fn new() -> Self {
		Self {
			sections: Vec::new(),
			item_count: 0,
		}
	}

	/// Appends a section whose items carry no content revisions.
	pub fn section(&mut self, id: S, items: impl IntoIterator<Item = I>) -> &mut Self {
		let items: Vec<I> = items.into_iter().collect();
		self.item_count += items.len();
		self.sections.push(SectionSnapshot {
			id,
			items,
			revisions: Vec::new(),
		});
		self
	}

	/// Appends a section whose items carry content revisions.
	///
	/// An item that keeps its identity but changes revision is reported as a
	/// reload rather than a removal.
	pub fn section_with_revisions(&mut self, id: S, items: impl IntoIterator<Item = (I, u64)>) -> &mut Self {
		let (items, revisions): (Vec<I>, Vec<u64>) = items.into_iter().unzip();
		self.item_count += items.len();
		self.sections.push(SectionSnapshot { id, items, revisions });
		self
	}

	/// Finishes the snapshot, computing its identity hash.
	pub fn build(&mut self) -> Snapshot<S, I> {
		let sections = std::mem::take(&mut self.sections);
		let item_count = std::mem::take(&mut self.item_count);

		let mut hasher = FxHasher::default();
		sections.len().hash(&mut hasher);
		for section in &sections {
			section.id.hash(&mut hasher);
			section.items.len().hash(&mut hasher);
			for item in &section.items {
				item.hash(&mut hasher);
			}
			section.revisions.hash(&mut hasher);
		}

		Snapshot {
			sections,
			item_count,
			id: SnapshotId(hasher.finish()),
		}
	}
}

impl<S: Identity, I: Identity> Default for SnapshotBuilder<S, I> {
	fn default() -> Self {
		Self::new()
	}
}
