//! Snapshot diffing into section- and item-level edit scripts.
//!
//! The section sequence is diffed first. Every section identity present on
//! both sides then gets its own item-level [`Difference`]. Sections that exist
//! only in the new snapshot are bulk inserts and carry no item diff; removed
//! sections likewise subsume the removal of their items.
//!
//! Scripts computed here reproduce the new snapshot by construction. The one
//! defect they can carry is a repeated identity on the new side, which makes
//! positional anchors ambiguous; it is detected while pairing and reported by
//! [`EditScript::validate_sections`] and [`EditScript::malformed_edits`].

use rustc_hash::FxHashMap;
use stacklist_primitives::{Identity, ItemPath};

use crate::difference::Difference;
use crate::error::ScriptViolation;
use crate::snapshot::{SectionSnapshot, Snapshot};

/// Item-level changes for a section present in both snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemChanges<S, I> {
	/// Identity of the section.
	pub section: S,
	/// Position of the section in the old snapshot.
	pub old_index: usize,
	/// Position of the section in the new snapshot.
	pub new_index: usize,
	/// Insertions, removals and moves of item identities.
	pub difference: Difference<I>,
	/// New offsets of items whose identity persisted but whose content revision changed.
	pub reloads: Vec<usize>,
}

impl<S, I: Identity> ItemChanges<S, I> {
	/// Returns why the item script cannot be applied positionally, if it cannot.
	pub fn violation(&self) -> Option<ScriptViolation> {
		self.difference
			.repeated_offset()
			.map(|offset| ScriptViolation::DuplicateIdentity { offset })
	}
}

/// Fallback replacing a malformed item script: delete every item of the
/// section and re-append the new contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionReset<S> {
	/// Identity of the section.
	pub section: S,
	/// Position of the section in the old snapshot.
	pub old_index: usize,
	/// Position of the section in the new snapshot.
	pub new_index: usize,
	/// Item count before the reset.
	pub old_count: usize,
	/// Item count after the reset.
	pub new_count: usize,
	/// New offsets of persisting items whose content revision changed.
	pub reloads: Vec<usize>,
	/// Why the item script was rejected.
	pub reason: ScriptViolation,
}

/// Per-section item update within an [`EditScript`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionEdit<S, I> {
	/// Apply the minimal item script.
	Items(ItemChanges<S, I>),
	/// Replace the section's items wholesale.
	Reset(SectionReset<S>),
}

impl<S, I> SectionEdit<S, I> {
	/// Returns the identity of the edited section.
	pub fn section(&self) -> &S {
		match self {
			SectionEdit::Items(changes) => &changes.section,
			SectionEdit::Reset(reset) => &reset.section,
		}
	}

	/// Returns the position of the edited section in the old snapshot.
	pub fn old_index(&self) -> usize {
		match self {
			SectionEdit::Items(changes) => changes.old_index,
			SectionEdit::Reset(reset) => reset.old_index,
		}
	}
}

/// Minimal edit script between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditScript<S, I> {
	sections: Difference<S>,
	edits: Vec<SectionEdit<S, I>>,
	initial_load: bool,
}

impl<S: Identity, I: Identity> EditScript<S, I> {
	/// Diffs `old` against `new`.
	pub fn compute(old: &Snapshot<S, I>, new: &Snapshot<S, I>) -> Self {
		let old_ids = old.section_ids();
		let new_ids = new.section_ids();
		let sections = Difference::compute(&old_ids, &new_ids);

		let mut old_positions: FxHashMap<&S, usize> = FxHashMap::with_capacity_and_hasher(old_ids.len(), Default::default());
		for (index, id) in old_ids.iter().enumerate() {
			old_positions.insert(id, index);
		}

		let mut edits = Vec::new();
		for (new_index, new_section) in new.sections().iter().enumerate() {
			let Some(&old_index) = old_positions.get(new_section.id()) else {
				continue;
			};
			let Some(old_section) = old.section(old_index) else {
				continue;
			};

			let revised = old_section.tracks_revisions() && new_section.tracks_revisions();
			let mut reloads = Vec::new();
			let difference = Difference::compute_with(old_section.items(), new_section.items(), |new_offset, old_offset| {
				if revised && old_section.revision(old_offset) != new_section.revision(new_offset) {
					reloads.push(new_offset);
				}
			});
			if difference.is_empty() && reloads.is_empty() {
				continue;
			}
			edits.push(SectionEdit::Items(ItemChanges {
				section: new_section.id().clone(),
				old_index,
				new_index,
				difference,
				reloads,
			}));
		}

		Self {
			sections,
			edits,
			initial_load: false,
		}
	}

	/// Script for a first load: every section is inserted, nothing is diffed.
	pub fn initial_load(new: &Snapshot<S, I>) -> Self {
		Self {
			sections: Difference::inserting_all(&new.section_ids()),
			edits: Vec::new(),
			initial_load: true,
		}
	}

	/// Returns the section-level difference.
	pub fn sections(&self) -> &Difference<S> {
		&self.sections
	}

	/// Returns the per-section item updates, in new-snapshot order.
	pub fn edits(&self) -> &[SectionEdit<S, I>] {
		&self.edits
	}

	/// Returns true if this script was produced without a previous snapshot.
	pub fn is_initial_load(&self) -> bool {
		self.initial_load
	}

	/// Returns true if the script changes nothing.
	pub fn is_empty(&self) -> bool {
		self.sections.is_empty() && self.edits.is_empty()
	}

	/// Returns the number of sections replaced by a reset.
	pub fn reset_count(&self) -> usize {
		self.edits.iter().filter(|e| matches!(e, SectionEdit::Reset(_))).count()
	}

	/// Checks the section-level script: section identities in the new snapshot
	/// must be unique.
	pub fn validate_sections(&self) -> Result<(), ScriptViolation> {
		match self.sections.repeated_offset() {
			Some(offset) => Err(ScriptViolation::DuplicateIdentity { offset }),
			None => Ok(()),
		}
	}

	/// Returns `(edit position, violation)` for every item script that cannot be applied.
	pub fn malformed_edits(&self) -> Vec<(usize, ScriptViolation)> {
		self.edits
			.iter()
			.enumerate()
			.filter_map(|(position, edit)| match edit {
				SectionEdit::Items(changes) => changes.violation().map(|violation| (position, violation)),
				SectionEdit::Reset(_) => None,
			})
			.collect()
	}

	/// Replaces the item script at `position` with a full section reset.
	pub fn reset_edit(&mut self, position: usize, reason: ScriptViolation, old: &Snapshot<S, I>, new: &Snapshot<S, I>) {
		let Some(SectionEdit::Items(changes)) = self.edits.get(position) else {
			return;
		};
		let reset = SectionReset {
			section: changes.section.clone(),
			old_index: changes.old_index,
			new_index: changes.new_index,
			old_count: old.section(changes.old_index).map_or(0, SectionSnapshot::len),
			new_count: new.section(changes.new_index).map_or(0, SectionSnapshot::len),
			reloads: changes.reloads.clone(),
			reason,
		};
		self.edits[position] = SectionEdit::Reset(reset);
	}

	/// Applies the script to `old`, reading bulk-inserted and reset sections from `new`.
	///
	/// Returns the resulting `(section, items)` sequence, which equals `new`'s
	/// structure whenever the script is well formed.
	pub fn apply(&self, old: &Snapshot<S, I>, new: &Snapshot<S, I>) -> Result<Vec<(S, Vec<I>)>, ScriptViolation> {
		let section_ids = self.sections.apply(&old.section_ids())?;

		let mut old_positions: FxHashMap<&S, usize> = FxHashMap::default();
		for (index, section) in old.sections().iter().enumerate() {
			old_positions.insert(section.id(), index);
		}
		let mut edits: FxHashMap<&S, &SectionEdit<S, I>> = FxHashMap::default();
		for edit in &self.edits {
			edits.insert(edit.section(), edit);
		}

		let mut inserted = self.sections.pure_insertions().map(|i| i.offset).peekable();
		let mut result = Vec::with_capacity(section_ids.len());
		for (offset, id) in section_ids.into_iter().enumerate() {
			let bulk = inserted.next_if_eq(&offset).is_some();
			let items = if bulk {
				new.section(offset).map(|s| s.items().to_vec()).unwrap_or_default()
			} else {
				let carried = old_positions
					.get(&id)
					.and_then(|&index| old.section(index))
					.map(|s| s.items().to_vec())
					.unwrap_or_default();
				match edits.get(&id) {
					Some(SectionEdit::Items(changes)) => changes.difference.apply(&carried)?,
					Some(SectionEdit::Reset(reset)) => new.section(reset.new_index).map(|s| s.items().to_vec()).unwrap_or_default(),
					None => carried,
				}
			};
			result.push((id, items));
		}
		Ok(result)
	}
}

/// Paths that persist from `old` into `new` with a different content revision.
///
/// Sections are matched by identity, so this also works when the section-level
/// script was rejected.
pub(crate) fn revised_paths<S: Identity, I: Identity>(old: &Snapshot<S, I>, new: &Snapshot<S, I>) -> Vec<ItemPath<S, I>> {
	let old_sections: FxHashMap<&S, &SectionSnapshot<S, I>> = old.sections().iter().map(|section| (section.id(), section)).collect();

	let mut paths = Vec::new();
	for new_section in new.sections() {
		let Some(old_section) = old_sections.get(new_section.id()) else {
			continue;
		};
		for offset in changed_revisions(old_section, new_section) {
			paths.extend(new_section.item_path(offset));
		}
	}
	paths
}

/// New offsets of items whose revision differs from their old revision.
fn changed_revisions<S: Identity, I: Identity>(old: &SectionSnapshot<S, I>, new: &SectionSnapshot<S, I>) -> Vec<usize> {
	if !old.tracks_revisions() || !new.tracks_revisions() {
		return Vec::new();
	}

	let mut previous: FxHashMap<&I, u64> = FxHashMap::with_capacity_and_hasher(old.len(), Default::default());
	for (offset, item) in old.items().iter().enumerate() {
		if let Some(revision) = old.revision(offset) {
			previous.insert(item, revision);
		}
	}

	new.items()
		.iter()
		.enumerate()
		.filter(|(offset, item)| match (previous.get(item), new.revision(*offset)) {
			(Some(before), Some(after)) => *before != after,
			_ => false,
		})
		.map(|(offset, _)| offset)
		.collect()
}
