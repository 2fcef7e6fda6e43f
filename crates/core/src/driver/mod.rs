//! The reconciliation cycle.
//!
//! A [`Driver`] owns the item cache and the last applied snapshot for one list
//! instance. Each [`Driver::reconcile`] call runs a single synchronous cycle:
//!
//! ```text
//! Idle -> SnapshotBuilt -> Diffed -> CacheInvalidated -> TranslatorRebuilt -> Applied -> Idle
//! ```
//!
//! Updates that arrive between cycles are coalesced: only the newest pending
//! snapshot is diffed, and always against the last applied one. Malformed item
//! scripts degrade to a section reset (or, by policy, a full reload);
//! malformed section scripts always degrade to a full reload. Neither is an
//! error from the caller's point of view.

mod scroll;

use std::num::NonZeroUsize;

use stacklist_primitives::{Identity, IndexPath, ItemPath};
use tracing::{debug, trace, trace_span, warn};

use self::scroll::{Anchor, ScrollCapture, corrected_offset, surviving_anchor};
use crate::cache::{ItemMetrics, ListCache};
use crate::config::{FallbackPolicy, ListConfig};
use crate::diff::{EditScript, SectionEdit, revised_paths};
use crate::error::ConfigError;
use crate::metrics::ReconcileMetrics;
use crate::snapshot::Snapshot;
use crate::surface::{ContentProvider, ListDataSource, RenderSurface, SurfaceUpdate};
use crate::translator::PositionMap;

/// Where the driver currently is in its cycle.
///
/// Outside of [`Driver::reconcile`] the phase is always [`Idle`](Self::Idle)
/// or [`TornDown`](Self::TornDown).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CyclePhase {
	/// Holding the last applied snapshot.
	#[default]
	Idle,
	/// A new snapshot was taken from the pending queue.
	SnapshotBuilt,
	/// The edit script is known.
	Diffed,
	/// Cache entries for removed or changed paths are gone.
	CacheInvalidated,
	/// The position map reflects the new snapshot.
	TranslatorRebuilt,
	/// The surface has applied the update.
	Applied,
	/// The list was torn down; the driver ignores further work.
	TornDown,
}

/// Details of a successfully applied batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
	/// No snapshot had been applied before this one.
	pub initial_load: bool,
	/// Sections whose item script was replaced by a reset.
	pub section_resets: usize,
	/// The scroll offset was moved to hold the visual anchor.
	pub scroll_corrected: bool,
}

/// Result of one [`Driver::reconcile`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
	/// No update was enqueued since the last cycle.
	NothingPending,
	/// The pending snapshot matched the applied one; the surface was not touched.
	Unchanged,
	/// A minimal batch was applied.
	Applied(ApplySummary),
	/// The section-level script was unusable and the surface reloaded everything.
	Reloaded {
		/// The scroll offset was moved to hold the visual anchor.
		scroll_corrected: bool,
	},
	/// The driver has been torn down.
	TornDown,
}

/// What the surface will be told to do this cycle.
enum Plan<S, I> {
	Batch(EditScript<S, I>),
	Reload,
}

/// Identity-keyed reconciler for one sectioned list.
///
/// `E` is the expensive per-item artifact (materialized content) and `C` the
/// cheap per-item facts, [`ItemMetrics`] by default.
pub struct Driver<S, I, E, C = ItemMetrics> {
	config: ListConfig,
	cache: ListCache<S, I, E, C>,
	applied: Option<Snapshot<S, I>>,
	pending: Option<Snapshot<S, I>>,
	phase: CyclePhase,
	metrics: ReconcileMetrics,
}

impl<S: Identity, I: Identity, E, C: Default> Driver<S, I, E, C> {
	/// Creates an idle driver with an empty cache.
	pub fn new(config: ListConfig) -> Result<Self, ConfigError> {
		config.validate()?;
		let cache = ListCache::from_config(&config)?;
		Ok(Self {
			config,
			cache,
			applied: None,
			pending: None,
			phase: CyclePhase::Idle,
			metrics: ReconcileMetrics::new(),
		})
	}

	/// Queues `snapshot` for the next cycle, replacing any snapshot still pending.
	pub fn enqueue(&mut self, snapshot: Snapshot<S, I>) {
		if self.phase == CyclePhase::TornDown {
			trace!("list.enqueue_after_teardown");
			return;
		}
		if self.pending.replace(snapshot).is_some() {
			self.metrics.coalesced_updates += 1;
			debug!(coalesced = self.metrics.coalesced_updates, "list.coalesce");
		}
	}

	/// Takes a fresh snapshot from `source` and queues it.
	pub fn enqueue_from<D>(&mut self, source: &D)
	where
		D: ListDataSource<SectionId = S, ItemId = I>,
	{
		self.enqueue(source.snapshot());
	}

	/// Returns true if a snapshot is waiting for the next cycle.
	pub fn has_pending(&self) -> bool {
		self.pending.is_some()
	}

	/// Runs one reconciliation cycle against `surface`.
	pub fn reconcile<R>(&mut self, surface: &mut R) -> ReconcileOutcome
	where
		R: RenderSurface<S, I, C>,
	{
		if self.phase == CyclePhase::TornDown {
			return ReconcileOutcome::TornDown;
		}
		let Some(new) = self.pending.take() else {
			return ReconcileOutcome::NothingPending;
		};

		self.metrics.cycles += 1;
		let span = trace_span!("list.reconcile", cycle = self.metrics.cycles);
		let _guard = span.enter();
		self.enter(CyclePhase::SnapshotBuilt);

		if self.config.skip_identical_snapshots
			&& let Some(applied) = &self.applied
			&& new.is_interchangeable(applied)
		{
			self.metrics.identical_skips += 1;
			trace!(id = ?new.id(), "list.identical_snapshot");
			self.enter(CyclePhase::Idle);
			return ReconcileOutcome::Unchanged;
		}

		let old = self.applied.take();
		let initial_load = old.is_none();
		let plan = self.plan(old.as_ref(), &new);
		self.enter(CyclePhase::Diffed);

		let new_positions = PositionMap::rebuild(&new);
		let capture = self.config.preserve_scroll_offset.then(|| self.capture_scroll(&*surface, &new_positions));

		if let Some(old) = &old {
			self.invalidate(old, &new, &plan, &new_positions);
		}
		self.enter(CyclePhase::CacheInvalidated);

		self.cache.replace_positions(new_positions);
		self.enter(CyclePhase::TranslatorRebuilt);

		let update = match &plan {
			Plan::Batch(script) => SurfaceUpdate::Batch { script, snapshot: &new },
			Plan::Reload => SurfaceUpdate::Reload { snapshot: &new },
		};
		surface.apply(update, &mut self.cache.measure_scope());
		self.enter(CyclePhase::Applied);

		let scroll_corrected = capture.is_some_and(|capture| self.restore_scroll(surface, capture));

		self.applied = Some(new);
		self.enter(CyclePhase::Idle);

		match plan {
			Plan::Batch(script) => ReconcileOutcome::Applied(ApplySummary {
				initial_load,
				section_resets: script.reset_count(),
				scroll_corrected,
			}),
			Plan::Reload => ReconcileOutcome::Reloaded { scroll_corrected },
		}
	}

	/// Returns the content at `index_path`, asking `provider` only on a cache miss.
	pub fn content_at<P>(&mut self, index_path: IndexPath, provider: &mut P) -> Option<&mut E>
	where
		P: ContentProvider<S, I, E>,
	{
		self.cache.expensive_at_with(index_path, |path| provider.make_content(path))
	}

	/// Returns the cheap entry at `index_path`, creating it on first access.
	pub fn cheap_at(&mut self, index_path: IndexPath) -> Option<&mut C> {
		self.cache.cheap_at(index_path)
	}

	/// Resolves a position in the applied snapshot to its item path.
	pub fn item_path_at(&self, index_path: IndexPath) -> Option<&ItemPath<S, I>> {
		self.cache.positions().item_path(index_path)
	}

	/// Resolves an item path to its position in the applied snapshot.
	pub fn index_path_of(&self, path: &ItemPath<S, I>) -> Option<IndexPath> {
		self.cache.positions().index_path(path)
	}

	/// Stops the driver: drops pending and applied snapshots and empties the cache.
	///
	/// Later [`enqueue`](Self::enqueue) and [`reconcile`](Self::reconcile) calls do nothing.
	pub fn teardown(&mut self) {
		if self.phase == CyclePhase::TornDown {
			return;
		}
		self.pending = None;
		self.applied = None;
		self.cache.invalidate_all();
		self.phase = CyclePhase::TornDown;
		debug!(cycles = self.metrics.cycles, "list.teardown");
	}

	/// Returns true once [`teardown`](Self::teardown) has run.
	pub fn is_torn_down(&self) -> bool {
		self.phase == CyclePhase::TornDown
	}

	/// Resizes the expensive cache tier.
	pub fn set_expensive_capacity(&mut self, capacity: NonZeroUsize) {
		self.config.expensive_capacity = capacity.get();
		self.cache.set_expensive_capacity(capacity);
	}

	/// Returns the last applied snapshot.
	pub fn snapshot(&self) -> Option<&Snapshot<S, I>> {
		self.applied.as_ref()
	}

	/// Returns the current cycle phase.
	pub fn phase(&self) -> CyclePhase {
		self.phase
	}

	/// Returns the accumulated counters.
	pub fn metrics(&self) -> &ReconcileMetrics {
		&self.metrics
	}

	/// Returns the active configuration.
	pub fn config(&self) -> &ListConfig {
		&self.config
	}

	/// Returns the item cache.
	pub fn cache(&self) -> &ListCache<S, I, E, C> {
		&self.cache
	}

	/// Returns the item cache for identity-keyed get-or-insert and invalidation.
	pub fn cache_mut(&mut self) -> &mut ListCache<S, I, E, C> {
		&mut self.cache
	}

	fn enter(&mut self, phase: CyclePhase) {
		trace!(from = ?self.phase, to = ?phase, "list.phase");
		self.phase = phase;
	}

	/// Diffs `new` against `old` and decides how each malformed part degrades.
	fn plan(&mut self, old: Option<&Snapshot<S, I>>, new: &Snapshot<S, I>) -> Plan<S, I> {
		let Some(old) = old else {
			trace!(sections = new.section_count(), items = new.item_count(), "list.initial_load");
			return Plan::Batch(EditScript::initial_load(new));
		};

		self.metrics.diffs_computed += 1;
		let mut script = EditScript::compute(old, new);

		if let Err(violation) = script.validate_sections() {
			warn!(%violation, "list.section_script_rejected");
			self.metrics.full_reloads += 1;
			return Plan::Reload;
		}

		for (position, violation) in script.malformed_edits() {
			let section = script.edits().get(position).map(|edit| edit.section().clone());
			warn!(?section, %violation, "list.item_script_rejected");
			match self.config.fallback {
				FallbackPolicy::FullReload => {
					self.metrics.full_reloads += 1;
					debug!("list.full_reload");
					return Plan::Reload;
				}
				FallbackPolicy::SectionReset => {
					script.reset_edit(position, violation, old, new);
					self.metrics.section_resets += 1;
					debug!(?section, "list.section_reset");
				}
			}
		}

		trace!(
			removed_sections = script.sections().removals().len(),
			inserted_sections = script.sections().insertions().len(),
			edited_sections = script.edits().len(),
			"list.diffed"
		);
		Plan::Batch(script)
	}

	/// Drops cache entries for every path the update removes or whose content changed.
	fn invalidate(&mut self, old: &Snapshot<S, I>, new: &Snapshot<S, I>, plan: &Plan<S, I>, new_positions: &PositionMap<S, I>) {
		let script = match plan {
			Plan::Batch(script) => script,
			Plan::Reload => {
				let mut removed = 0usize;
				for path in old.item_paths() {
					if !new_positions.contains(&path) && self.cache.invalidate(&path) {
						removed += 1;
					}
				}
				let mut revised = 0usize;
				for path in revised_paths(old, new) {
					if self.cache.invalidate_cheap(&path) {
						revised += 1;
					}
				}
				trace!(removed, revised, "list.invalidate_reload");
				return;
			}
		};

		for removal in script.sections().pure_removals() {
			self.cache.invalidate_section(&removal.element);
		}

		for edit in script.edits() {
			match edit {
				SectionEdit::Items(changes) => {
					for removal in changes.difference.pure_removals() {
						self.cache.invalidate(&ItemPath::new(removal.element.clone(), changes.section.clone()));
					}
					let Some(section) = new.section(changes.new_index) else {
						continue;
					};
					for &offset in &changes.reloads {
						if let Some(path) = section.item_path(offset) {
							self.cache.invalidate_cheap(&path);
						}
					}
				}
				SectionEdit::Reset(reset) => {
					if let Some(section) = old.section(reset.old_index) {
						for offset in 0..section.len() {
							if let Some(path) = section.item_path(offset)
								&& !new_positions.contains(&path)
							{
								self.cache.invalidate(&path);
							}
						}
					}
					let Some(section) = new.section(reset.new_index) else {
						continue;
					};
					for &offset in &reset.reloads {
						if let Some(path) = section.item_path(offset) {
							self.cache.invalidate_cheap(&path);
						}
					}
				}
			}
		}
	}

	fn capture_scroll<R>(&self, surface: &R, new_positions: &PositionMap<S, I>) -> ScrollCapture<S, I>
	where
		R: RenderSurface<S, I, C>,
	{
		let anchor = surface
			.anchor_index_path()
			.and_then(|start| surviving_anchor(self.cache.positions(), new_positions, start))
			.and_then(|(index_path, path)| {
				Some(Anchor {
					path,
					origin: surface.item_frame(index_path)?.origin,
				})
			});
		ScrollCapture {
			offset: surface.scroll_offset(),
			content: surface.content_size(),
			anchor,
		}
	}

	fn restore_scroll<R>(&mut self, surface: &mut R, capture: ScrollCapture<S, I>) -> bool
	where
		R: RenderSurface<S, I, C>,
	{
		let anchor_moved = capture.anchor.and_then(|anchor| {
			let index_path = self.cache.positions().index_path(&anchor.path)?;
			Some((anchor.origin, surface.item_frame(index_path)?.origin))
		});

		let Some(offset) = corrected_offset(capture.offset, capture.content, surface.content_size(), surface.viewport_size(), anchor_moved)
		else {
			return false;
		};

		surface.set_scroll_offset(offset);
		self.metrics.scroll_corrections += 1;
		debug!(from = ?capture.offset, to = ?offset, "list.scroll_corrected");
		true
	}
}

#[cfg(test)]
mod tests;
