use std::fs::File;
use std::io::Read;
use std::path::Path as FsPath;

use tracing::debug;

use crate::mapper::{Data, MapError, Mapper, Result, Type, Value, stringify_keys};

/// Parses raw content into a dynamic document.
pub trait Decoder {
	/// Decode `content` into a `{string: any}` mapping.
	fn decode(&self, content: &[u8]) -> Result<Value>;
}

/// JSON documents; the top level must be an object.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
	fn decode(&self, content: &[u8]) -> Result<Value> {
		let json: serde_json::Value = serde_json::from_slice(content)?;
		if !json.is_object() {
			return Err(MapError::NotAMapping);
		}
		Ok(Value::from_json(json))
	}
}

/// YAML documents; every mapping key is stringified after parsing.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlDecoder;

impl Decoder for YamlDecoder {
	fn decode(&self, content: &[u8]) -> Result<Value> {
		let yaml: serde_yaml::Value = serde_yaml::from_slice(content)?;
		match yaml {
			serde_yaml::Value::Null => Ok(Value::document([])),
			serde_yaml::Value::Mapping(_) => Ok(stringify_keys(yaml_value(yaml)).into_concrete()),
			_ => Err(MapError::NotAMapping),
		}
	}
}

/// JSON when the trimmed content starts with `{`, YAML otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoDecoder;

impl AutoDecoder {
	/// Whether `content` is routed to the JSON decoder.
	pub fn is_json(content: &[u8]) -> bool {
		content.trim_ascii_start().starts_with(b"{")
	}
}

impl Decoder for AutoDecoder {
	fn decode(&self, content: &[u8]) -> Result<Value> {
		if Self::is_json(content) {
			debug!(bytes = content.len(), decoder = "json", "auto-detected decoder");
			JsonDecoder.decode(content)
		} else {
			debug!(bytes = content.len(), decoder = "yaml", "auto-detected decoder");
			YamlDecoder.decode(content)
		}
	}
}

fn yaml_value(yaml: serde_yaml::Value) -> Value {
	match yaml {
		serde_yaml::Value::Null => Value::any_nil(),
		serde_yaml::Value::Bool(value) => Value::bool(value),
		serde_yaml::Value::Number(number) => {
			if let Some(value) = number.as_i64() {
				Value::i64(value)
			} else if let Some(value) = number.as_u64() {
				Value::u64(value)
			} else {
				Value::f64(number.as_f64().unwrap_or(f64::NAN))
			}
		}
		serde_yaml::Value::String(value) => Value::string(value),
		serde_yaml::Value::Sequence(items) => Value::sequence(Type::dynamic(), items.into_iter().map(|item| Value::any(yaml_value(item))).collect()),
		serde_yaml::Value::Mapping(entries) => Value::mapping(
			Type::mapping(Type::dynamic(), Type::dynamic()),
			entries.into_iter().map(|(key, value)| (Value::any(yaml_value(key)), Value::any(yaml_value(value)))),
		),
		serde_yaml::Value::Tagged(tagged) => yaml_value(tagged.value),
	}
}

/// Loads a document from text, bytes, a stream, or a file.
#[derive(Default)]
pub struct Loader {
	document: Option<Value>,
	decoder: Option<Box<dyn Decoder>>,
}

impl Loader {
	/// Loader using [`AutoDecoder`].
	pub fn new() -> Self {
		Self::default()
	}

	/// Loader using an explicit decoder.
	pub fn with_decoder(decoder: impl Decoder + 'static) -> Self {
		Self {
			document: None,
			decoder: Some(Box::new(decoder)),
		}
	}

	/// Decode text content.
	pub fn load_str(&mut self, content: &str) -> Result<()> {
		self.load_bytes(content.as_bytes())
	}

	/// Decode raw content, replacing any previously loaded document.
	pub fn load_bytes(&mut self, content: &[u8]) -> Result<()> {
		let document = match &self.decoder {
			Some(decoder) => decoder.decode(content)?,
			None => AutoDecoder.decode(content)?,
		};
		if !matches!(document.data(), Data::Mapping(Some(_))) {
			return Err(MapError::NotAMapping);
		}
		debug!(bytes = content.len(), entries = document.len(), "loaded document");
		self.document = Some(document);
		Ok(())
	}

	/// Read `stream` to the end and decode it.
	pub fn load_stream(&mut self, mut stream: impl Read) -> Result<()> {
		let mut content = Vec::new();
		stream.read_to_end(&mut content)?;
		self.load_bytes(&content)
	}

	/// Decode a file; an empty path or `-` reads standard input.
	pub fn load_file(&mut self, path: impl AsRef<FsPath>) -> Result<()> {
		let path = path.as_ref();
		if path.as_os_str().is_empty() || path.as_os_str() == "-" {
			return self.load_stream(std::io::stdin().lock());
		}
		debug!(path = %path.display(), "loading file");
		self.load_stream(File::open(path)?)
	}

	/// Whether a document has been loaded.
	pub fn loaded(&self) -> bool {
		self.document.is_some()
	}

	/// Loaded `{string: any}` document.
	pub fn document(&self) -> Option<&Value> {
		self.document.as_ref()
	}

	/// Take the loaded document.
	pub fn into_document(self) -> Option<Value> {
		self.document
	}

	/// Map the loaded document into `dst`; does nothing when nothing is loaded.
	pub fn as_value(&self, mapper: &Mapper, dst: &mut Value) -> Result<()> {
		match &self.document {
			Some(document) => mapper.map(dst, document),
			None => Ok(()),
		}
	}
}

impl std::fmt::Debug for Loader {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Loader")
			.field("document", &self.document)
			.field("decoder", &self.decoder.is_some())
			.finish()
	}
}
