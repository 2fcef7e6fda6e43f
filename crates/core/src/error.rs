//! Error types for configuration and edit-script validation.

use thiserror::Error;

/// Errors that can occur when loading list configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or field types.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// The expensive tier must be able to hold at least one entry.
	#[error("expensive_capacity must be at least 1")]
	ZeroCapacity,
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Why an edit script could not be applied to the sequence it was computed from.
///
/// These are recovered locally by the driver (section reset or full reload)
/// and never surface to callers as failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScriptViolation {
	/// A removal's offset is out of range or names a different element.
	#[error("removal at offset {offset} does not match the source sequence")]
	RemovalMismatch {
		/// Offset in the source sequence.
		offset: usize,
	},

	/// An insertion targets a position whose preceding anchor does not exist.
	#[error("insertion at offset {offset} has no anchor (only {len} elements precede it)")]
	InsertOutOfBounds {
		/// Offset in the target sequence.
		offset: usize,
		/// Number of elements available before the insertion point.
		len: usize,
	},

	/// The script's result does not reproduce the target sequence.
	#[error("applied script diverges from the target at offset {offset}")]
	Diverged {
		/// First differing offset.
		offset: usize,
	},

	/// The target sequence repeats an identity, so anchors are ambiguous.
	#[error("identity at offset {offset} is not unique")]
	DuplicateIdentity {
		/// Offset of the second occurrence.
		offset: usize,
	},
}
