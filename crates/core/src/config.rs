//! List configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config.

use std::num::NonZeroUsize;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// How the driver recovers from an item-level edit script that fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
	/// Delete and re-append only the affected section.
	#[default]
	SectionReset,
	/// Reload the whole surface from the new snapshot.
	FullReload,
}

/// Tunables for one list instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListConfig {
	/// Maximum number of entries held by the expensive cache tier.
	pub expensive_capacity: usize,
	/// Keep the first visible item in place when content size changes.
	pub preserve_scroll_offset: bool,
	/// Recovery strategy for malformed item-level scripts.
	pub fallback: FallbackPolicy,
	/// Skip diffing entirely when the new snapshot is interchangeable with the applied one.
	pub skip_identical_snapshots: bool,
}

impl ListConfig {
	/// Default expensive-tier capacity.
	pub const DEFAULT_EXPENSIVE_CAPACITY: usize = 100;

	/// Parses and validates a TOML document.
	pub fn from_toml_str(source: &str) -> Result<Self> {
		let config: Self = toml::from_str(source)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks invariants serde cannot express.
	pub fn validate(&self) -> Result<()> {
		self.expensive_capacity_nonzero().map(|_| ())
	}

	/// Returns the expensive-tier capacity as a non-zero count.
	pub fn expensive_capacity_nonzero(&self) -> Result<NonZeroUsize> {
		NonZeroUsize::new(self.expensive_capacity).ok_or(ConfigError::ZeroCapacity)
	}
}

impl Default for ListConfig {
	fn default() -> Self {
		Self {
			expensive_capacity: Self::DEFAULT_EXPENSIVE_CAPACITY,
			preserve_scroll_offset: true,
			fallback: FallbackPolicy::SectionReset,
			skip_identical_snapshots: true,
		}
	}
}
