use crate::mapper::Field;

/// Annotation key probed when a mapper has none configured.
pub const DEFAULT_FIELD_TAG: &str = "json";

/// Mapping behavior derived from one record field's visibility and annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldInfo {
	/// Field is visible to the mapper.
	pub exported: bool,
	/// Annotation is `-`; the field is never mapped.
	pub ignore: bool,
	/// Annotation is `*`; the field catches unmatched input.
	pub wildcard: bool,
	/// Flatten a named record field into its parent.
	pub squash: bool,
	/// Skip empty values when flattening into a mapping.
	pub omit_empty: bool,
	/// External name; empty for embedded and wildcard fields.
	pub name: String,
}

impl FieldInfo {
	/// Field participates in name-based matching.
	pub fn is_named(&self) -> bool {
		self.exported && !self.ignore && !self.name.is_empty()
	}
}

/// Parse `field` against the ordered annotation keys in `tags`.
///
/// The first key carrying a non-empty annotation wins. Its first
/// comma-separated token is `-`, `*`, or the external name; later tokens may
/// be `squash` or `omitempty`.
pub fn parse_field(field: &Field, tags: &[String]) -> FieldInfo {
	let mut info = FieldInfo {
		exported: field.public,
		..FieldInfo::default()
	};
	if field.embedded || !info.exported {
		return info;
	}

	info.name = field.name.to_string();
	let annotation = if tags.is_empty() {
		field.tag_value(DEFAULT_FIELD_TAG).filter(|value| !value.is_empty())
	} else {
		tags.iter().find_map(|tag| field.tag_value(tag).filter(|value| !value.is_empty()))
	};
	let Some(annotation) = annotation else {
		return info;
	};

	let mut tokens = annotation.split(',');
	match tokens.next().unwrap_or_default() {
		"-" => info.ignore = true,
		"*" => {
			info.wildcard = true;
			info.name.clear();
		}
		"" => {}
		name => info.name = name.to_owned(),
	}
	for token in tokens {
		match token {
			"squash" => info.squash = true,
			"omitempty" => info.omit_empty = true,
			_ => {}
		}
	}
	info
}
