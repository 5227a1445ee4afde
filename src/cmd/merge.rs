use std::path::PathBuf;

use tracing::{debug, warn};
use valmap::mapper::{AggregatedError, MapError, Mapper, Result, Type, Value};

use crate::cmd::util::{Format, emit_json};

#[derive(clap::Args)]
pub struct Args {
	/// Documents merged left to right.
	#[arg(required = true)]
	pub paths: Vec<PathBuf>,
	#[arg(long, value_enum, default_value_t = Format::Auto)]
	pub format: Format,
	#[arg(long)]
	pub json: bool,
}

/// Map every document into one accumulating document; nested mappings merge
/// instead of being replaced.
pub fn run(args: Args) -> Result<()> {
	let Args { paths, format, json } = args;

	let mapper = Mapper::new();
	let mut merged = Value::zero(&Type::document());
	let mut errs = AggregatedError::new();
	let mut sources = Vec::with_capacity(paths.len());

	for path in &paths {
		let label = path.display().to_string();
		let mut loader = format.loader();
		if errs.add(loader.load_file(path).map_err(|err| source_error(&label, err))).is_none() {
			warn!(path = %label, "skipping unreadable document");
			continue;
		}
		debug!(path = %label, "merging document");
		if errs.add(loader.as_value(&mapper, &mut merged).map_err(|err| source_error(&label, err))).is_some() {
			sources.push(label);
		}
	}

	let document = merged.to_json();
	if json {
		emit_json(&MergeJson {
			sources,
			errors: errs.errors().iter().map(ToString::to_string).collect(),
			document,
		})?;
	} else {
		emit_json(&document)?;
	}
	errs.aggregate()
}

fn source_error(label: &str, err: MapError) -> MapError {
	MapError::Field {
		name: label.to_owned(),
		source: Box::new(err),
	}
}

#[derive(serde::Serialize)]
struct MergeJson {
	sources: Vec<String>,
	errors: Vec<String>,
	document: serde_json::Value,
}
