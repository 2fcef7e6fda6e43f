//! Minimal insert/remove difference between two identity sequences.
//!
//! Identities are unique within a collection, so the longest common
//! subsequence of two sequences is the longest increasing run of old offsets
//! taken in new order. That reduces the edit-distance problem to a patience
//! LIS in `O(n log n)`, using one pass over each side to pair elements.
//!
//! Elements outside the retained run become removals (by old offset) and
//! insertions (by new offset). An element present on both sides but outside
//! the run is a move, expressed as a coupled removal and insertion whose
//! `moved_to` / `moved_from` fields point at each other.
//!
//! The pairing pass over the new side also records the first repeated
//! identity, since a repeat leaves the script's anchors ambiguous for a
//! positional surface.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::ScriptViolation;

/// Removal of the element at `offset` in the old sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal<T> {
	/// Offset in the old sequence.
	pub offset: usize,
	/// The removed element.
	pub element: T,
	/// New offset of the same element when this removal is half of a move.
	pub moved_to: Option<usize>,
}

/// Insertion of `element` at `offset` in the new sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion<T> {
	/// Offset in the new sequence.
	pub offset: usize,
	/// The inserted element.
	pub element: T,
	/// Old offset of the same element when this insertion is half of a move.
	pub moved_from: Option<usize>,
}

/// Edit script turning one ordered sequence into another.
///
/// Removals are sorted by ascending old offset and insertions by ascending new
/// offset, matching batch-update semantics: removals address the sequence
/// before the update, insertions the sequence after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference<T> {
	pub(crate) removals: Vec<Removal<T>>,
	pub(crate) insertions: Vec<Insertion<T>>,
	pub(crate) repeated: Option<usize>,
}

impl<T> Default for Difference<T> {
	fn default() -> Self {
		Self {
			removals: Vec::new(),
			insertions: Vec::new(),
			repeated: None,
		}
	}
}

impl<T: Clone + Eq + std::hash::Hash> Difference<T> {
	/// Computes a minimal difference from `old` to `new`.
	///
	/// If an identity repeats in `old`, only its last occurrence can be
	/// retained; the script is still correct, just not minimal. A repeat in
	/// `new` is reported by [`repeated_offset`](Self::repeated_offset).
	pub fn compute(old: &[T], new: &[T]) -> Self {
		Self::compute_with(old, new, |_, _| {})
	}

	/// Like [`compute`](Self::compute), also calling `on_pair(new_offset, old_offset)`
	/// for every element present on both sides, in ascending new offset.
	pub fn compute_with(old: &[T], new: &[T], mut on_pair: impl FnMut(usize, usize)) -> Self {
		let mut old_offsets: FxHashMap<&T, usize> = FxHashMap::with_capacity_and_hasher(old.len(), Default::default());
		for (offset, element) in old.iter().enumerate() {
			old_offsets.insert(element, offset);
		}

		// (new offset, old offset) for every element present on both sides.
		let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(new.len().min(old.len()));
		let mut seen: FxHashSet<&T> = FxHashSet::with_capacity_and_hasher(new.len(), Default::default());
		let mut repeated = None;
		for (offset, element) in new.iter().enumerate() {
			if !seen.insert(element) && repeated.is_none() {
				repeated = Some(offset);
			}
			if let Some(&old_offset) = old_offsets.get(element) {
				pairs.push((offset, old_offset));
				on_pair(offset, old_offset);
			}
		}

		let mut kept_old = vec![false; old.len()];
		let mut kept_new = vec![false; new.len()];
		for k in longest_increasing_run(&pairs) {
			let (new_offset, old_offset) = pairs[k];
			kept_old[old_offset] = true;
			kept_new[new_offset] = true;
		}

		// A displaced element couples to the first new offset that claimed it.
		let mut old_to_new: Vec<Option<usize>> = vec![None; old.len()];
		let mut new_to_old: Vec<Option<usize>> = vec![None; new.len()];
		for &(new_offset, old_offset) in &pairs {
			if kept_old[old_offset] || kept_new[new_offset] || old_to_new[old_offset].is_some() {
				continue;
			}
			old_to_new[old_offset] = Some(new_offset);
			new_to_old[new_offset] = Some(old_offset);
		}

		let removals = old
			.iter()
			.enumerate()
			.filter(|(offset, _)| !kept_old[*offset])
			.map(|(offset, element)| Removal {
				offset,
				element: element.clone(),
				moved_to: old_to_new[offset],
			})
			.collect();

		let insertions = new
			.iter()
			.enumerate()
			.filter(|(offset, _)| !kept_new[*offset])
			.map(|(offset, element)| Insertion {
				offset,
				element: element.clone(),
				moved_from: new_to_old[offset],
			})
			.collect();

		Self {
			removals,
			insertions,
			repeated,
		}
	}

	/// Returns a difference that inserts every element of `new` into an empty sequence.
	pub fn inserting_all(new: &[T]) -> Self {
		Self {
			removals: Vec::new(),
			insertions: new
				.iter()
				.enumerate()
				.map(|(offset, element)| Insertion {
					offset,
					element: element.clone(),
					moved_from: None,
				})
				.collect(),
			repeated: None,
		}
	}

	/// Returns the offset of the first identity in the new sequence that repeats
	/// an earlier one.
	pub fn repeated_offset(&self) -> Option<usize> {
		self.repeated
	}

	/// Returns true if the difference contains no changes.
	pub fn is_empty(&self) -> bool {
		self.removals.is_empty() && self.insertions.is_empty()
	}

	/// Returns the removals, ascending by old offset.
	pub fn removals(&self) -> &[Removal<T>] {
		&self.removals
	}

	/// Returns the insertions, ascending by new offset.
	pub fn insertions(&self) -> &[Insertion<T>] {
		&self.insertions
	}

	/// Iterates over removals that are not half of a move.
	pub fn pure_removals(&self) -> impl Iterator<Item = &Removal<T>> {
		self.removals.iter().filter(|r| r.moved_to.is_none())
	}

	/// Iterates over insertions that are not half of a move.
	pub fn pure_insertions(&self) -> impl Iterator<Item = &Insertion<T>> {
		self.insertions.iter().filter(|i| i.moved_from.is_none())
	}

	/// Iterates over `(old offset, new offset)` pairs of moved elements.
	pub fn moves(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
		self.removals.iter().filter_map(|r| r.moved_to.map(|to| (r.offset, to)))
	}

	/// Applies the difference to `old`, producing the new sequence.
	///
	/// Runs in linear time. Every removal must name the element actually at
	/// its offset, and every insertion must land directly after an element
	/// that exists at that point (its anchor).
	pub fn apply(&self, old: &[T]) -> Result<Vec<T>, ScriptViolation> {
		let mut survivors = Vec::with_capacity(old.len().saturating_sub(self.removals.len()));
		let mut removals = self.removals.iter().peekable();
		for (offset, element) in old.iter().enumerate() {
			match removals.peek() {
				Some(removal) if removal.offset == offset => {
					if removal.element != *element {
						return Err(ScriptViolation::RemovalMismatch { offset });
					}
					removals.next();
				}
				_ => survivors.push(element.clone()),
			}
		}
		if let Some(removal) = removals.next() {
			return Err(ScriptViolation::RemovalMismatch { offset: removal.offset });
		}

		let mut result = Vec::with_capacity(survivors.len() + self.insertions.len());
		let mut survivors = survivors.into_iter();
		for insertion in &self.insertions {
			while result.len() < insertion.offset {
				match survivors.next() {
					Some(element) => result.push(element),
					None => {
						return Err(ScriptViolation::InsertOutOfBounds {
							offset: insertion.offset,
							len: result.len(),
						});
					}
				}
			}
			if result.len() != insertion.offset {
				return Err(ScriptViolation::InsertOutOfBounds {
					offset: insertion.offset,
					len: result.len(),
				});
			}
			result.push(insertion.element.clone());
		}
		result.extend(survivors);
		Ok(result)
	}

	/// Checks that applying the difference to `old` reproduces `new` exactly.
	pub fn validate(&self, old: &[T], new: &[T]) -> Result<(), ScriptViolation> {
		let applied = self.apply(old)?;
		if let Some(offset) = applied.iter().zip(new).position(|(a, b)| a != b) {
			return Err(ScriptViolation::Diverged { offset });
		}
		if applied.len() != new.len() {
			return Err(ScriptViolation::Diverged {
				offset: applied.len().min(new.len()),
			});
		}
		Ok(())
	}
}

/// Returns positions into `pairs` forming a longest run with strictly increasing old offsets.
fn longest_increasing_run(pairs: &[(usize, usize)]) -> Vec<usize> {
	// tails[len] = position of the smallest old offset ending a run of length len + 1
	let mut tails: Vec<usize> = Vec::new();
	let mut prev: Vec<Option<usize>> = vec![None; pairs.len()];

	for (k, &(_, old_offset)) in pairs.iter().enumerate() {
		let len = tails.partition_point(|&t| pairs[t].1 < old_offset);
		if len > 0 {
			prev[k] = Some(tails[len - 1]);
		}
		if len == tails.len() {
			tails.push(k);
		} else {
			tails[len] = k;
		}
	}

	let mut run = Vec::with_capacity(tails.len());
	let mut cursor = tails.last().copied();
	while let Some(k) = cursor {
		run.push(k);
		cursor = prev[k];
	}
	run.reverse();
	run
}
