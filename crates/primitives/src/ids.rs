use std::fmt;
use std::hash::Hash;

/// A stable, position-independent identity token for a section or an item.
///
/// Identities must be deterministic for equal values and unique within their
/// containing collection: section identities across all sections, item
/// identities within the section that holds them. Uniqueness is a caller
/// precondition and is not checked on the hot path; duplicate identities
/// degrade reconciliation to a reset of the affected section.
pub trait Identity: Clone + Eq + Hash + fmt::Debug {}

impl<T: Clone + Eq + Hash + fmt::Debug> Identity for T {}

/// A model value that carries its own identity.
///
/// This is the native-conformance counterpart to passing an identity accessor
/// closure when building a snapshot.
pub trait Identifiable {
	/// The identity type.
	type Id: Identity;

	/// Returns this value's identity.
	fn id(&self) -> Self::Id;
}

/// Stable address of an item: its identity plus the identity of its section.
///
/// Unlike an [`IndexPath`], an item path survives reordering, so it is the key
/// under which per-item cache entries live.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemPath<S, I> {
	/// Identity of the item.
	pub item: I,
	/// Identity of the section containing the item.
	pub section: S,
}

impl<S, I> ItemPath<S, I> {
	/// Creates a new item path.
	pub fn new(item: I, section: S) -> Self {
		Self { item, section }
	}
}

/// Positional address of an item in the rendered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexPath {
	/// Section position.
	pub section: usize,
	/// Item position within the section.
	pub item: usize,
}

impl IndexPath {
	/// Creates a new index path.
	pub const fn new(section: usize, item: usize) -> Self {
		Self { section, item }
	}
}

impl fmt::Display for IndexPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}, {}]", self.section, self.item)
	}
}
