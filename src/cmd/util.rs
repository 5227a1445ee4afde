use std::io::Read;
use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;
use valmap::mapper::{AutoDecoder, JsonDecoder, Loader, Result, YamlDecoder};

/// Input decoder selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
	/// Sniff the content: a leading `{` means JSON.
	#[default]
	Auto,
	/// JSON object.
	Json,
	/// YAML mapping.
	Yaml,
}

impl Format {
	/// Concrete decoder label for `content`.
	pub(crate) fn resolve(self, content: &[u8]) -> &'static str {
		match self {
			Self::Json => "json",
			Self::Yaml => "yaml",
			Self::Auto if AutoDecoder::is_json(content) => "json",
			Self::Auto => "yaml",
		}
	}

	/// Loader configured for this format.
	pub(crate) fn loader(self) -> Loader {
		match self {
			Self::Auto => Loader::new(),
			Self::Json => Loader::with_decoder(JsonDecoder),
			Self::Yaml => Loader::with_decoder(YamlDecoder),
		}
	}
}

/// Read a file, or standard input for `-`.
pub(crate) fn read_input(path: &Path) -> Result<Vec<u8>> {
	let mut content = Vec::new();
	if path.as_os_str() == "-" {
		std::io::stdin().lock().read_to_end(&mut content)?;
	} else {
		content = std::fs::read(path)?;
	}
	Ok(content)
}

/// Print a pretty JSON payload on stdout.
pub(crate) fn emit_json<T: Serialize>(payload: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(payload)?);
	Ok(())
}
