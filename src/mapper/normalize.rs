use crate::mapper::{Data, Type, Value};

/// Rewrite every mapping reachable through sequences and dynamic slots into
/// `{string: any}`, rendering non-string keys textually.
///
/// Later keys win when two keys render to the same text.
pub fn stringify_keys(value: Value) -> Value {
	let ty = value.ty().clone();
	match value.data() {
		Data::Dynamic(Some(inner)) => Value::any(stringify_keys((**inner).clone())),
		Data::Sequence(items) => Value::new(ty, Data::Sequence(items.iter().cloned().map(stringify_keys).collect())),
		Data::Mapping(Some(map)) => {
			let entries: Vec<(Value, Value)> = map.borrow().iter().map(|(key, value)| (key.clone(), value.clone())).collect();
			Value::mapping(
				Type::document(),
				entries.into_iter().map(|(key, value)| (Value::string(key_text(&key)), Value::any(stringify_keys(value)))),
			)
		}
		_ => value,
	}
}

fn key_text(key: &Value) -> String {
	key.concrete().map_or_else(|| "null".to_owned(), Value::to_string)
}
