//! In-memory table surface for reconciliation tests.
//!
//! The table keeps its own row model and mutates it only through the
//! positional operations in each batch, the way a cell-reuse table view
//! would. Tests then compare that row model against the snapshot.

use rustc_hash::FxHashMap;
use stacklist_core::{
	Driver, IndexPath, ItemMetrics, ListConfig, MeasureScope, Point, Rect, RenderSurface, SectionEdit, Size, Snapshot,
	SurfaceUpdate,
};

pub type Section = &'static str;
pub type Item = u32;
pub type TestDriver = Driver<Section, Item, String>;

pub const ROW_HEIGHT: f64 = 50.0;
pub const ROW_WIDTH: f64 = 300.0;
pub const VIEWPORT: Size = Size::new(300.0, 200.0);

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt::try_init();
}

pub fn driver() -> TestDriver {
	init_tracing();
	Driver::new(ListConfig::default()).unwrap()
}

pub fn snapshot(sections: &[(Section, &[Item])]) -> Snapshot<Section, Item> {
	let mut builder = Snapshot::builder();
	for (id, items) in sections {
		builder.section(*id, items.iter().copied());
	}
	builder.build()
}

/// Returns `(section, items)` pairs in snapshot order.
pub fn structure(snapshot: &Snapshot<Section, Item>) -> Vec<(Section, Vec<Item>)> {
	snapshot
		.sections()
		.iter()
		.map(|section| (*section.id(), section.items().to_vec()))
		.collect()
}

#[derive(Debug, Default)]
pub struct Table {
	pub rows: Vec<(Section, Vec<Item>)>,
	pub offset: Point,
	pub batches: usize,
	pub reloads: usize,
	pub resets: usize,
	pub item_reloads: usize,
	/// Rows whose measurement differed from the cached one.
	pub remeasured: usize,
}

impl Table {
	pub fn new() -> Self {
		Self::default()
	}

	fn row_count_before(&self, section: usize) -> usize {
		self.rows.iter().take(section).map(|(_, items)| items.len()).sum()
	}

	fn apply_batch(&mut self, update: SurfaceUpdate<'_, Section, Item>) {
		let SurfaceUpdate::Batch { script, snapshot } = update else {
			return;
		};

		// Section removals address the old layout, so go back to front.
		let mut moved: FxHashMap<Section, Vec<Item>> = FxHashMap::default();
		for removal in script.sections().removals().iter().rev() {
			let (id, items) = self.rows.remove(removal.offset);
			assert_eq!(id, removal.element, "section removal hit the wrong row");
			if removal.moved_to.is_some() {
				moved.insert(id, items);
			}
		}
		for insertion in script.sections().insertions() {
			let items = match insertion.moved_from {
				Some(_) => moved.remove(&insertion.element).unwrap(),
				None => snapshot.section(insertion.offset).unwrap().items().to_vec(),
			};
			self.rows.insert(insertion.offset, (insertion.element, items));
		}

		for edit in script.edits() {
			match edit {
				SectionEdit::Items(changes) => {
					let (id, items) = &mut self.rows[changes.new_index];
					assert_eq!(*id, changes.section);
					for removal in changes.difference.removals().iter().rev() {
						let removed = items.remove(removal.offset);
						assert_eq!(removed, removal.element, "item removal hit the wrong row");
					}
					for insertion in changes.difference.insertions() {
						items.insert(insertion.offset, insertion.element);
					}
					self.item_reloads += changes.reloads.len();
				}
				SectionEdit::Reset(reset) => {
					let fresh = snapshot.section(reset.new_index).unwrap().items().to_vec();
					self.rows[reset.new_index].1 = fresh;
					self.resets += 1;
				}
			}
		}
		self.batches += 1;
	}
}

impl RenderSurface<Section, Item> for Table {
	fn scroll_offset(&self) -> Point {
		self.offset
	}

	fn set_scroll_offset(&mut self, offset: Point) {
		self.offset = offset;
	}

	fn content_size(&self) -> Size {
		let rows: usize = self.rows.iter().map(|(_, items)| items.len()).sum();
		Size::new(ROW_WIDTH, rows as f64 * ROW_HEIGHT)
	}

	fn viewport_size(&self) -> Size {
		VIEWPORT
	}

	fn anchor_index_path(&self) -> Option<IndexPath> {
		let mut top = 0.0;
		for (section, (_, items)) in self.rows.iter().enumerate() {
			for item in 0..items.len() {
				top += ROW_HEIGHT;
				if top > self.offset.y {
					return Some(IndexPath::new(section, item));
				}
			}
		}
		None
	}

	fn item_frame(&self, index_path: IndexPath) -> Option<Rect> {
		let (_, items) = self.rows.get(index_path.section)?;
		if index_path.item >= items.len() {
			return None;
		}
		let row = self.row_count_before(index_path.section) + index_path.item;
		Some(Rect::new(0.0, row as f64 * ROW_HEIGHT, ROW_WIDTH, ROW_HEIGHT))
	}

	fn apply(&mut self, update: SurfaceUpdate<'_, Section, Item>, scope: &mut MeasureScope<'_, Section, Item, ItemMetrics>) {
		match update {
			SurfaceUpdate::Batch { .. } => self.apply_batch(update),
			SurfaceUpdate::Reload { snapshot } => {
				self.rows = structure(snapshot);
				self.reloads += 1;
			}
		}

		for (section, (_, items)) in self.rows.iter().enumerate() {
			for item in 0..items.len() {
				if scope.record_size(IndexPath::new(section, item), Size::new(ROW_WIDTH, ROW_HEIGHT)) {
					self.remeasured += 1;
				}
			}
		}
	}
}
