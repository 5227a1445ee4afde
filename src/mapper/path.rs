use std::fmt;

use crate::mapper::Value;

/// Diagnostic location of one assignment step.
///
/// Field names are joined with `.`; `*` marks a pointer dereference, `@` a
/// held dynamic value, `+` a container merge, and `[..]` an index or key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path(String);

impl Path {
	/// Empty path of a top-level call.
	pub fn root() -> Self {
		Self::default()
	}

	/// Rendered path text.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Step into a named field.
	pub fn field(&self, name: &str) -> Self {
		if self.0.is_empty() {
			return Self(name.to_owned());
		}
		Self(format!("{}.{name}", self.0))
	}

	/// Step through a pointer.
	pub fn deref(&self) -> Self {
		self.marker('*')
	}

	/// Step into a held dynamic value.
	pub fn dynamic(&self) -> Self {
		self.marker('@')
	}

	/// Step into a container merge.
	pub fn merge(&self) -> Self {
		self.marker('+')
	}

	/// Step into a sequence element.
	pub fn index(&self, index: usize) -> Self {
		Self(format!("{}[{index}]", self.0))
	}

	/// Step into a mapping entry.
	pub fn key(&self, key: &Value) -> Self {
		Self(format!("{}[{key}]", self.0))
	}

	fn marker(&self, marker: char) -> Self {
		let mut out = self.0.clone();
		out.push(marker);
		Self(out)
	}
}

impl fmt::Display for Path {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
