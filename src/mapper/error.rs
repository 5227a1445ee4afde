use thiserror::Error;

use crate::mapper::AggregatedError;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, MapError>;

/// Errors produced while loading documents and assigning values.
#[derive(Debug, Error)]
pub enum MapError {
	/// Destination handle is structurally invalid.
	#[error("invalid value")]
	InvalidValue,
	/// Destination slot exists but cannot be replaced.
	#[error("not allowed to set value at {path:?}")]
	NotAllowedToSet {
		/// Assignment path of the fixed slot.
		path: String,
	},
	/// Mapping key types cannot be reconciled.
	#[error("map key type mismatch: {from} -> {to} at {path:?}")]
	KeyTypeMismatch {
		/// Source key type.
		from: String,
		/// Destination key type.
		to: String,
		/// Assignment path of the mapping.
		path: String,
	},
	/// No assignable, convertible, or wildcard path between two types.
	#[error("unable to assign from type {from} to {to} at {path:?}")]
	IncompatibleTypes {
		/// Source runtime type.
		from: String,
		/// Destination declared type.
		to: String,
		/// Assignment path where the mismatch occurred.
		path: String,
	},
	/// Every attempt to populate one external name failed.
	#[error("{name}: {source}")]
	Field {
		/// External field name.
		name: String,
		/// First error recorded for the name.
		#[source]
		source: Box<MapError>,
	},
	/// A shared target was already being written further up the recursion.
	#[error("shared target already borrowed at {path:?}")]
	Aliased {
		/// Assignment path of the conflicting target.
		path: String,
	},
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// JSON content failed to parse.
	#[error("json: {0}")]
	Json(#[from] serde_json::Error),
	/// YAML content failed to parse.
	#[error("yaml: {0}")]
	Yaml(#[from] serde_yaml::Error),
	/// Decoded document is not a mapping.
	#[error("content is not a map")]
	NotAMapping,
	/// Several independent errors reported together.
	#[error(transparent)]
	Aggregate(AggregatedError),
}

impl MapError {
	/// Innermost error beneath any per-field wrappers.
	pub fn root_cause(&self) -> &MapError {
		match self {
			Self::Field { source, .. } => source.root_cause(),
			other => other,
		}
	}

	pub(crate) fn incompatible(from: impl ToString, to: impl ToString, path: &str) -> Self {
		Self::IncompatibleTypes {
			from: from.to_string(),
			to: to.to_string(),
			path: path.to_owned(),
		}
	}

	pub(crate) fn key_mismatch(from: impl ToString, to: impl ToString, path: &str) -> Self {
		Self::KeyTypeMismatch {
			from: from.to_string(),
			to: to.to_string(),
			path: path.to_owned(),
		}
	}
}
