use std::collections::HashMap;

use crate::mapper::{MapError, Result, Value};

#[derive(Default)]
struct NameOutcome {
	succeeded: usize,
	errors: Vec<MapError>,
}

/// Per-name success and failure tally for one record or mapping conversion.
#[derive(Default)]
pub(super) struct Outcomes {
	order: Vec<String>,
	names: HashMap<String, NameOutcome>,
}

impl Outcomes {
	fn entry(&mut self, name: &str) -> &mut NameOutcome {
		if !self.names.contains_key(name) {
			self.order.push(name.to_owned());
		}
		self.names.entry(name.to_owned()).or_default()
	}

	pub(super) fn succeeded(&mut self, name: &str) {
		self.entry(name).succeeded += 1;
	}

	pub(super) fn failed(&mut self, name: &str, err: MapError) {
		self.entry(name).errors.push(err);
	}

	pub(super) fn record(&mut self, name: &str, result: Result<()>) {
		match result {
			Ok(()) => self.succeeded(name),
			Err(err) => self.failed(name, err),
		}
	}

	/// First error of the first name, in first-seen order, that never succeeded.
	pub(super) fn into_result(mut self) -> Result<()> {
		for name in self.order {
			let Some(outcome) = self.names.remove(&name) else {
				continue;
			};
			if outcome.succeeded > 0 {
				continue;
			}
			if let Some(first) = outcome.errors.into_iter().next() {
				return Err(MapError::Field { name, source: Box::new(first) });
			}
		}
		Ok(())
	}
}

pub(super) struct PendingKey {
	pub(super) key: Value,
	pub(super) value: Value,
	pub(super) assigned: bool,
}

/// Source mapping entries keyed by their string form, awaiting a destination field.
#[derive(Default)]
pub(super) struct PendingKeys {
	entries: Vec<PendingKey>,
	by_name: HashMap<String, usize>,
}

impl PendingKeys {
	/// Later entries with the same string form replace earlier ones.
	pub(super) fn insert(&mut self, name: String, key: Value, value: Value) {
		let entry = PendingKey { key, value, assigned: false };
		match self.by_name.get(&name) {
			Some(&index) => self.entries[index] = entry,
			None => {
				self.by_name.insert(name, self.entries.len());
				self.entries.push(entry);
			}
		}
	}

	pub(super) fn position(&self, name: &str) -> Option<usize> {
		self.by_name.get(name).copied()
	}

	pub(super) fn value(&self, index: usize) -> &Value {
		&self.entries[index].value
	}

	pub(super) fn mark_assigned(&mut self, index: usize) {
		self.entries[index].assigned = true;
	}

	pub(super) fn unassigned(&self) -> impl Iterator<Item = &PendingKey> {
		self.entries.iter().filter(|entry| !entry.assigned)
	}
}
