//! Collaborator interfaces consumed by the [`Driver`](crate::Driver).
//!
//! The rendering surface, the data source, and the row-content provider all
//! live outside this crate. They talk to the driver only through these traits.

use stacklist_primitives::{Identity, IndexPath, ItemPath, Point, Rect, Size};

use crate::cache::{ItemMetrics, MeasureScope};
use crate::diff::EditScript;
use crate::snapshot::Snapshot;

/// Supplies the current sectioned data on demand.
///
/// No assumption is made about the source between calls; the driver takes a
/// fresh snapshot every time.
pub trait ListDataSource {
	/// Section identity type.
	type SectionId: Identity;
	/// Item identity type.
	type ItemId: Identity;

	/// Captures the current data as an immutable snapshot.
	fn snapshot(&self) -> Snapshot<Self::SectionId, Self::ItemId>;
}

/// Materializes row content for an item the surface asked for.
///
/// Invoked lazily, only on an expensive-tier miss.
pub trait ContentProvider<S, I, E> {
	/// Builds the content for `path`.
	fn make_content(&mut self, path: &ItemPath<S, I>) -> E;
}

impl<S, I, E, F> ContentProvider<S, I, E> for F
where
	F: FnMut(&ItemPath<S, I>) -> E,
{
	fn make_content(&mut self, path: &ItemPath<S, I>) -> E {
		self(path)
	}
}

/// One reconciliation result handed to the surface.
#[derive(Debug)]
pub enum SurfaceUpdate<'a, S, I> {
	/// Apply a minimal batch of section and item edits.
	///
	/// Section removals and item removals address the previous snapshot;
	/// insertions address `snapshot`, which is also where bulk-inserted and
	/// reset sections read their items from.
	Batch {
		/// The edits to perform.
		script: &'a EditScript<S, I>,
		/// The snapshot the batch produces.
		snapshot: &'a Snapshot<S, I>,
	},
	/// Discard everything and reload from `snapshot`.
	Reload {
		/// The snapshot to display.
		snapshot: &'a Snapshot<S, I>,
	},
}

impl<S, I> Clone for SurfaceUpdate<'_, S, I> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<S, I> Copy for SurfaceUpdate<'_, S, I> {}

impl<'a, S, I> SurfaceUpdate<'a, S, I> {
	/// Returns the snapshot the surface shows once the update is applied.
	pub fn snapshot(&self) -> &'a Snapshot<S, I> {
		match *self {
			SurfaceUpdate::Batch { snapshot, .. } | SurfaceUpdate::Reload { snapshot } => snapshot,
		}
	}

	/// Returns true for the full-reload fallback.
	pub fn is_reload(&self) -> bool {
		matches!(self, SurfaceUpdate::Reload { .. })
	}
}

/// Positional rendering surface driven by the reconciler.
///
/// Geometry is in scroll-content coordinates. Before [`apply`](Self::apply)
/// runs, index paths refer to the previously applied snapshot; afterwards
/// they refer to the new one.
pub trait RenderSurface<S, I, C = ItemMetrics> {
	/// Returns the current scroll offset.
	fn scroll_offset(&self) -> Point;

	/// Moves the scroll offset without animation.
	fn set_scroll_offset(&mut self, offset: Point);

	/// Returns the total scrollable content size.
	fn content_size(&self) -> Size;

	/// Returns the visible viewport size.
	fn viewport_size(&self) -> Size;

	/// Returns the item the user is looking at, usually the first visible one.
	///
	/// Scroll preservation needs both this and [`item_frame`](Self::item_frame):
	/// the offset follows the anchor item when content grows or shrinks above
	/// it. A surface that returns `None` from either one gets its offset
	/// clamped to the new content size but never shifted.
	fn anchor_index_path(&self) -> Option<IndexPath>;

	/// Returns the laid-out frame of the item at `index_path`.
	///
	/// Called before and after [`apply`](Self::apply) for the anchor item.
	fn item_frame(&self, index_path: IndexPath) -> Option<Rect>;

	/// Applies `update`, laying out affected rows.
	///
	/// Measurement performed during layout goes through `scope`, which only
	/// reaches the cheap cache tier of the new snapshot.
	fn apply(&mut self, update: SurfaceUpdate<'_, S, I>, scope: &mut MeasureScope<'_, S, I, C>);
}
