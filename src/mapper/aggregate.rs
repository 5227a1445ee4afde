use std::fmt;

use crate::mapper::{MapError, Result};

/// Several independent errors collected across calls and reported together.
#[derive(Debug, Default)]
pub struct AggregatedError {
	errors: Vec<MapError>,
}

impl AggregatedError {
	/// Empty accumulator.
	pub fn new() -> Self {
		Self::default()
	}

	/// Record one error; nested aggregates are flattened into this one.
	pub fn add_err(&mut self, err: MapError) {
		match err {
			MapError::Aggregate(nested) => self.errors.extend(nested.errors),
			err => self.errors.push(err),
		}
	}

	/// Record the error of `result`, passing a success value through.
	pub fn add<T>(&mut self, result: Result<T>) -> Option<T> {
		match result {
			Ok(value) => Some(value),
			Err(err) => {
				self.add_err(err);
				None
			}
		}
	}

	/// Record every error yielded by `errs`.
	pub fn add_many(&mut self, errs: impl IntoIterator<Item = MapError>) -> &mut Self {
		for err in errs {
			self.add_err(err);
		}
		self
	}

	/// Collected errors in insertion order.
	pub fn errors(&self) -> &[MapError] {
		&self.errors
	}

	/// Number of collected errors.
	pub fn len(&self) -> usize {
		self.errors.len()
	}

	/// Whether nothing was collected.
	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	/// `Err` carrying the collected errors, or `Ok` when there are none.
	pub fn aggregate(self) -> Result<()> {
		if self.errors.is_empty() {
			return Ok(());
		}
		Err(MapError::Aggregate(self))
	}
}

impl fmt::Display for AggregatedError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.errors.is_empty() {
			return Ok(());
		}
		write!(f, "multiple errors:")?;
		for err in &self.errors {
			write!(f, "\n{err}")?;
		}
		Ok(())
	}
}

impl std::error::Error for AggregatedError {}
