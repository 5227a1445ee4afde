use serde_json::{Map as JsonMap, Number, Value as Json};

use crate::mapper::field::{DEFAULT_FIELD_TAG, parse_field};
use crate::mapper::{Data, Type, TypeClass, Value};

impl Value {
	/// Build a dynamic document from parsed JSON.
	///
	/// Objects become `{string: any}`, arrays `[any]`, integers `i64` (or
	/// `u64` above `i64::MAX`), other numbers `f64`, and `null` a nil `any`.
	pub fn from_json(json: Json) -> Value {
		match json {
			Json::Null => Value::any_nil(),
			Json::Bool(value) => Value::bool(value),
			Json::Number(number) => number_value(&number),
			Json::String(value) => Value::string(value),
			Json::Array(items) => Value::sequence(Type::dynamic(), items.into_iter().map(|item| Value::any(Value::from_json(item))).collect()),
			Json::Object(entries) => Value::mapping(
				Type::document(),
				entries.into_iter().map(|(key, value)| (Value::string(key), Value::any(Value::from_json(value)))),
			),
		}
	}

	/// Render as JSON.
	///
	/// Records use external field names with embedded and squashed records
	/// promoted; pointers and dynamic slots are followed; nil renders as null.
	pub fn to_json(&self) -> Json {
		let Some(value) = self.concrete() else {
			return Json::Null;
		};
		match value.data() {
			Data::Invalid | Data::Channel(_) | Data::Function(_) | Data::RawPointer(_) | Data::Dynamic(_) => Json::Null,
			Data::Bool(value) => Json::Bool(*value),
			Data::Int(value) => Json::from(*value),
			Data::Uint(value) => Json::from(*value),
			Data::Float(value) => float_json(*value),
			Data::Complex(re, im) => Json::Array(vec![float_json(*re), float_json(*im)]),
			Data::String(value) => Json::String(value.clone()),
			Data::Sequence(items) => Json::Array(items.iter().map(Value::to_json).collect()),
			Data::Mapping(None) | Data::Pointer(None) => Json::Null,
			Data::Mapping(Some(map)) => {
				let Ok(map) = map.try_borrow() else {
					return Json::Null;
				};
				Json::Object(map.iter().map(|(key, value)| (key.to_string(), value.to_json())).collect())
			}
			Data::Pointer(Some(target)) => target.try_borrow().map(|target| target.to_json()).unwrap_or(Json::Null),
			Data::Record(_) => {
				let mut out = JsonMap::new();
				record_json(value, &mut out);
				Json::Object(out)
			}
		}
	}
}

fn number_value(number: &Number) -> Value {
	if let Some(value) = number.as_i64() {
		return Value::i64(value);
	}
	if let Some(value) = number.as_u64() {
		return Value::u64(value);
	}
	Value::f64(number.as_f64().unwrap_or(f64::NAN))
}

fn float_json(value: f64) -> Json {
	Number::from_f64(value).map_or(Json::Null, Json::Number)
}

fn record_json(record: &Value, out: &mut JsonMap<String, Json>) {
	let Data::Record(values) = record.data() else {
		return;
	};
	let tags = [DEFAULT_FIELD_TAG.to_owned()];
	for (field, value) in record.ty().fields().iter().zip(values) {
		let info = parse_field(field, &tags);
		let is_record = TypeClass::of(&field.ty) == TypeClass::Record;
		if is_record && (field.embedded || info.squash) {
			record_json(value, out);
		} else if info.wildcard {
			if let Json::Object(entries) = value.to_json() {
				out.extend(entries);
			}
		} else if info.is_named() && !(info.omit_empty && value.is_empty()) {
			out.insert(info.name, value.to_json());
		}
	}
}
