use std::path::PathBuf;

use valmap::mapper::Result;

use crate::cmd::util::{Format, emit_json, read_input};

#[derive(clap::Args)]
pub struct Args {
	/// Document path, or `-` for stdin.
	pub path: PathBuf,
	#[arg(long, value_enum, default_value_t = Format::Auto)]
	pub format: Format,
	#[arg(long)]
	pub json: bool,
}

/// Load one document and print it with stringified keys.
pub fn run(args: Args) -> Result<()> {
	let Args { path, format, json } = args;

	let content = read_input(&path)?;
	let decoder = format.resolve(&content);
	let mut loader = format.loader();
	loader.load_bytes(&content)?;
	let document = loader.into_document().map(|doc| doc.to_json()).unwrap_or_default();

	if json {
		let entries = document.as_object().map_or(0, |map| map.len());
		return emit_json(&ShowJson {
			path: path.display().to_string(),
			decoder,
			entries,
			document,
		});
	}
	emit_json(&document)
}

#[derive(serde::Serialize)]
struct ShowJson {
	path: String,
	decoder: &'static str,
	entries: usize,
	document: serde_json::Value,
}
