//! Scroll-offset correction across a content-size-changing update.
//!
//! Before the surface applies an update the driver records where a visible
//! anchor item sits and how large the content is. Afterwards, on every axis
//! whose content extent changed, the offset moves by however far the anchor
//! moved. Growth above the anchor therefore pushes the offset down with it,
//! while growth below leaves it alone.

use stacklist_primitives::{Axis, Identity, IndexPath, ItemPath, Point, Size};

use crate::translator::PositionMap;

/// Scroll state captured before an update is applied.
#[derive(Debug, Clone)]
pub(crate) struct ScrollCapture<S, I> {
	pub offset: Point,
	pub content: Size,
	pub anchor: Option<Anchor<S, I>>,
}

/// An item that survives the update and its origin before the update.
#[derive(Debug, Clone)]
pub(crate) struct Anchor<S, I> {
	pub path: ItemPath<S, I>,
	pub origin: Point,
}

/// Picks the anchor item: the item at `start` in `old`, or the first item after
/// it in positional order that is still present in `new`.
///
/// Returns the anchor's old index path alongside its item path.
pub(crate) fn surviving_anchor<S: Identity, I: Identity>(
	old: &PositionMap<S, I>,
	new: &PositionMap<S, I>,
	start: IndexPath,
) -> Option<(IndexPath, ItemPath<S, I>)> {
	old.iter()
		.skip_while(|(index_path, _)| *index_path < start)
		.find(|(_, path)| new.contains(path))
		.map(|(index_path, path)| (index_path, path.clone()))
}

/// Computes the corrected offset, or `None` if the current one should stay.
///
/// `anchor_moved` is the anchor's `(old origin, new origin)`, absent when no
/// anchor could be tracked. In that case the offset is only clamped.
pub(crate) fn corrected_offset(
	offset: Point,
	before: Size,
	after: Size,
	viewport: Size,
	anchor_moved: Option<(Point, Point)>,
) -> Option<Point> {
	if before == after {
		return None;
	}

	let mut corrected = offset;
	if let Some((old_origin, new_origin)) = anchor_moved {
		for axis in Axis::ALL {
			if before.along(axis) == after.along(axis) {
				continue;
			}
			let delta = new_origin.along(axis) - old_origin.along(axis);
			corrected = corrected.with(axis, corrected.along(axis) + delta);
		}
	}

	let corrected = corrected.clamp_scroll(after, viewport);
	(corrected != offset).then_some(corrected)
}
