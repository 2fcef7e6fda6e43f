use std::num::NonZeroUsize;

use pretty_assertions::assert_eq;
use rstest::rstest;
use stacklist_primitives::{IndexPath, ItemPath, Point, Rect, Size};

use super::{ApplySummary, CyclePhase, Driver, ReconcileOutcome};
use crate::cache::{ItemMetrics, MeasureScope};
use crate::config::{FallbackPolicy, ListConfig};
use crate::error::ConfigError;
use crate::snapshot::Snapshot;
use crate::surface::{ListDataSource, RenderSurface, SurfaceUpdate};

/// Records what it was asked to do and measures every row at a fixed size.
#[derive(Default)]
struct RecordingSurface {
	batches: usize,
	reloads: usize,
	resets_seen: usize,
	item_counts: Vec<usize>,
	/// Skips measurement, leaving the cheap tier as the driver left it.
	lazy: bool,
}

impl RenderSurface<&'static str, u32> for RecordingSurface {
	fn scroll_offset(&self) -> Point {
		Point::ZERO
	}

	fn set_scroll_offset(&mut self, _offset: Point) {}

	fn content_size(&self) -> Size {
		Size::ZERO
	}

	fn viewport_size(&self) -> Size {
		Size::new(300.0, 200.0)
	}

	fn apply(&mut self, update: SurfaceUpdate<'_, &'static str, u32>, scope: &mut MeasureScope<'_, &'static str, u32, ItemMetrics>) {
		match update {
			SurfaceUpdate::Batch { script, .. } => {
				self.batches += 1;
				self.resets_seen += script.reset_count();
			}
			SurfaceUpdate::Reload { .. } => self.reloads += 1,
		}
		let snapshot = update.snapshot();
		self.item_counts.push(snapshot.item_count());
		if self.lazy {
			return;
		}
		for (section, contents) in snapshot.sections().iter().enumerate() {
			for item in 0..contents.len() {
				scope.record_size(IndexPath::new(section, item), Size::new(300.0, 50.0));
			}
		}
	}

	fn anchor_index_path(&self) -> Option<IndexPath> {
		None
	}

	fn item_frame(&self, _index_path: IndexPath) -> Option<Rect> {
		None
	}
}

type TestDriver = Driver<&'static str, u32, String>;

fn driver() -> TestDriver {
	let _ = tracing_subscriber::fmt::try_init();
	Driver::new(ListConfig::default()).unwrap()
}

fn snapshot(sections: &[(&'static str, &[u32])]) -> Snapshot<&'static str, u32> {
	let mut builder = Snapshot::builder();
	for (id, items) in sections {
		builder.section(*id, items.iter().copied());
	}
	builder.build()
}

#[test]
fn zero_capacity_config_is_rejected() {
	let config = ListConfig {
		expensive_capacity: 0,
		..ListConfig::default()
	};
	assert!(matches!(TestDriver::new(config), Err(ConfigError::ZeroCapacity)));
}

#[test]
fn reconcile_without_pending_does_nothing() {
	let mut driver = driver();
	let mut surface = RecordingSurface::default();
	assert_eq!(driver.reconcile(&mut surface), ReconcileOutcome::NothingPending);
	assert_eq!(surface.batches, 0);
	assert_eq!(driver.metrics().cycles, 0);
}

#[test]
fn first_cycle_is_an_initial_load() {
	let mut driver = driver();
	let mut surface = RecordingSurface::default();
	driver.enqueue(snapshot(&[("a", &[1, 2]), ("b", &[3])]));

	let outcome = driver.reconcile(&mut surface);
	assert_eq!(
		outcome,
		ReconcileOutcome::Applied(ApplySummary {
			initial_load: true,
			section_resets: 0,
			scroll_corrected: false,
		})
	);
	assert_eq!(driver.phase(), CyclePhase::Idle);
	assert_eq!(driver.metrics().diffs_computed, 0);
	assert_eq!(driver.item_path_at(IndexPath::new(1, 0)), Some(&ItemPath::new(3, "b")));
	assert_eq!(driver.cache().stats().cheap_entries, 3);
}

#[test]
fn burst_of_updates_collapses_into_one_diff() {
	let mut driver = driver();
	let mut surface = RecordingSurface::default();
	driver.enqueue(snapshot(&[("a", &[1, 2])]));
	driver.reconcile(&mut surface);

	driver.enqueue(snapshot(&[("a", &[1, 2, 3])]));
	driver.enqueue(snapshot(&[("a", &[0, 1, 2, 3, 4])]));
	assert!(driver.has_pending());
	driver.reconcile(&mut surface);

	assert_eq!(driver.metrics().coalesced_updates, 1);
	assert_eq!(driver.metrics().diffs_computed, 1);
	assert_eq!(surface.batches, 2);
	assert_eq!(surface.item_counts, vec![2, 5]);
	assert_eq!(driver.snapshot().map(Snapshot::item_count), Some(5));
	assert!(!driver.has_pending());
}

#[test]
fn identical_snapshot_skips_the_surface() {
	let mut driver = driver();
	let mut surface = RecordingSurface::default();
	driver.enqueue(snapshot(&[("a", &[1, 2])]));
	driver.reconcile(&mut surface);

	driver.enqueue(snapshot(&[("a", &[1, 2])]));
	assert_eq!(driver.reconcile(&mut surface), ReconcileOutcome::Unchanged);
	assert_eq!(surface.batches, 1);
	assert_eq!(driver.metrics().identical_skips, 1);
	assert_eq!(driver.metrics().diffs_computed, 0);
}

#[test]
fn identical_snapshot_is_diffed_when_skipping_is_disabled() {
	let config = ListConfig {
		skip_identical_snapshots: false,
		..ListConfig::default()
	};
	let mut driver = TestDriver::new(config).unwrap();
	let mut surface = RecordingSurface::default();
	driver.enqueue(snapshot(&[("a", &[1, 2])]));
	driver.reconcile(&mut surface);
	driver.enqueue(snapshot(&[("a", &[1, 2])]));

	assert!(matches!(driver.reconcile(&mut surface), ReconcileOutcome::Applied(_)));
	assert_eq!(driver.metrics().diffs_computed, 1);
	assert_eq!(surface.batches, 2);
}

#[test]
fn duplicate_items_reset_only_their_section() {
	let mut driver = driver();
	let mut surface = RecordingSurface::default();
	driver.enqueue(snapshot(&[("a", &[1, 2]), ("b", &[3])]));
	driver.reconcile(&mut surface);

	driver.enqueue(snapshot(&[("a", &[1, 2, 2]), ("b", &[3, 4])]));
	let outcome = driver.reconcile(&mut surface);

	assert!(matches!(outcome, ReconcileOutcome::Applied(ApplySummary { section_resets: 1, .. })));
	assert_eq!(surface.resets_seen, 1);
	assert_eq!(driver.metrics().section_resets, 1);
	assert_eq!(driver.metrics().full_reloads, 0);
}

#[test]
fn duplicate_items_reload_under_full_reload_policy() {
	let config = ListConfig {
		fallback: FallbackPolicy::FullReload,
		..ListConfig::default()
	};
	let mut driver = TestDriver::new(config).unwrap();
	let mut surface = RecordingSurface::default();
	driver.enqueue(snapshot(&[("a", &[1, 2])]));
	driver.reconcile(&mut surface);

	driver.enqueue(snapshot(&[("a", &[2, 2])]));
	assert_eq!(driver.reconcile(&mut surface), ReconcileOutcome::Reloaded { scroll_corrected: false });
	assert_eq!(surface.reloads, 1);
	assert_eq!(driver.metrics().full_reloads, 1);
}

fn revised(sections: &[(&'static str, &[(u32, u64)])]) -> Snapshot<&'static str, u32> {
	let mut builder = Snapshot::builder();
	for (id, items) in sections {
		builder.section_with_revisions(*id, items.iter().copied());
	}
	builder.build()
}

#[rstest]
#[case::section_reset(FallbackPolicy::SectionReset, &[("a", &[(1, 1), (2, 0), (2, 0)][..])])]
#[case::full_reload_policy(FallbackPolicy::FullReload, &[("a", &[(1, 1), (2, 0), (2, 0)][..])])]
#[case::duplicate_sections(FallbackPolicy::SectionReset, &[("a", &[(1, 1), (2, 0)][..]), ("a", &[(9, 0)][..])])]
fn fallbacks_drop_measurements_of_revised_items(
	#[case] fallback: FallbackPolicy,
	#[case] next: &[(&'static str, &[(u32, u64)])],
) {
	let config = ListConfig {
		fallback,
		..ListConfig::default()
	};
	let mut driver = TestDriver::new(config).unwrap();
	let mut surface = RecordingSurface {
		lazy: true,
		..RecordingSurface::default()
	};
	driver.enqueue(revised(&[("a", &[(1, 0), (2, 0)])]));
	driver.reconcile(&mut surface);

	let revised_path = ItemPath::new(1, "a");
	let untouched_path = ItemPath::new(2, "a");
	driver.cheap_at(IndexPath::new(0, 0)).unwrap().record(Size::new(300.0, 44.0));
	driver.cheap_at(IndexPath::new(0, 1)).unwrap().record(Size::new(300.0, 44.0));
	driver.content_at(IndexPath::new(0, 0), &mut |path: &ItemPath<&'static str, u32>| format!("row {}", path.item));

	driver.enqueue(revised(next));
	driver.reconcile(&mut surface);

	assert_eq!(driver.metrics().section_resets + driver.metrics().full_reloads, 1);
	assert_eq!(driver.cache().peek_cheap(&revised_path), None);
	assert!(driver.cache().contains_expensive(&revised_path));
	assert_eq!(
		driver.cache().peek_cheap(&untouched_path).and_then(|metrics| metrics.measured_size),
		Some(Size::new(300.0, 44.0))
	);
}

#[test]
fn duplicate_sections_force_a_full_reload() {
	let mut driver = driver();
	let mut surface = RecordingSurface::default();
	driver.enqueue(snapshot(&[("a", &[1]), ("b", &[2])]));
	driver.reconcile(&mut surface);

	driver.enqueue(snapshot(&[("a", &[1]), ("a", &[5])]));
	assert!(matches!(driver.reconcile(&mut surface), ReconcileOutcome::Reloaded { .. }));
	assert_eq!(surface.reloads, 1);
	// Section "b" vanished, so its cached metrics must be gone too.
	assert_eq!(driver.cache().section_entries(&"b"), 0);
}

#[test]
fn content_is_built_once_per_identity() {
	let mut driver = driver();
	let mut surface = RecordingSurface::default();
	driver.enqueue(snapshot(&[("a", &[1, 2])]));
	driver.reconcile(&mut surface);

	let mut built = 0;
	let mut provider = |path: &ItemPath<&'static str, u32>| {
		built += 1;
		format!("row {}", path.item)
	};
	assert_eq!(driver.content_at(IndexPath::new(0, 1), &mut provider).cloned(), Some("row 2".to_string()));

	// Item 2 moves to the front; its content is found under the same identity.
	driver.enqueue(snapshot(&[("a", &[2, 1])]));
	driver.reconcile(&mut surface);
	assert_eq!(driver.content_at(IndexPath::new(0, 0), &mut provider).cloned(), Some("row 2".to_string()));
	assert_eq!(driver.content_at(IndexPath::new(0, 9), &mut provider), None);
	drop(provider);
	assert_eq!(built, 1);
}

#[test]
fn teardown_clears_state_and_stops_cycles() {
	let mut driver = driver();
	let mut surface = RecordingSurface::default();
	driver.enqueue(snapshot(&[("a", &[1, 2])]));
	driver.reconcile(&mut surface);
	driver.enqueue(snapshot(&[("a", &[1])]));

	driver.teardown();
	assert!(driver.is_torn_down());
	assert!(!driver.has_pending());
	assert!(driver.snapshot().is_none());
	assert_eq!(driver.cache().stats().cheap_entries, 0);
	assert_eq!(driver.item_path_at(IndexPath::new(0, 0)), None);

	driver.enqueue(snapshot(&[("a", &[7])]));
	assert_eq!(driver.reconcile(&mut surface), ReconcileOutcome::TornDown);
	assert_eq!(surface.batches, 1);
}

#[test]
fn resizing_the_expensive_tier_updates_config() {
	let mut driver = driver();
	driver.set_expensive_capacity(NonZeroUsize::new(3).unwrap());
	assert_eq!(driver.config().expensive_capacity, 3);
	assert_eq!(driver.cache().expensive_capacity().get(), 3);
}

struct Fixed(Vec<(&'static str, Vec<u32>)>);

impl ListDataSource for Fixed {
	type SectionId = &'static str;
	type ItemId = u32;

	fn snapshot(&self) -> Snapshot<&'static str, u32> {
		Snapshot::build(self.0.iter().map(|(id, items)| (*id, items.iter())), |id: &&'static str| *id, |item: &&u32| **item)
	}
}

#[test]
fn data_source_feeds_the_queue() {
	let mut driver = driver();
	let mut surface = RecordingSurface::default();
	let source = Fixed(vec![("a", vec![1, 2]), ("b", vec![])]);

	driver.enqueue_from(&source);
	driver.reconcile(&mut surface);
	assert_eq!(driver.index_path_of(&ItemPath::new(2, "a")), Some(IndexPath::new(0, 1)));
	assert_eq!(driver.snapshot().map(Snapshot::section_count), Some(2));
}
