#![allow(missing_docs)]

use serde_json::json;
use valmap::mapper::{AggregatedError, Field, MapError, Type, Value, map};

#[test]
fn errors_from_independent_calls_are_reported_together() {
	let limits = Type::record(
		"Limits",
		vec![
			Field::new("Cpu", Type::u32()).tag("json", "cpu"),
			Field::new("Memory", Type::u64()).tag("json", "memory"),
		],
	);
	let inputs = [json!({"cpu": 2, "memory": 512}), json!({"cpu": 0.5}), json!({"memory": "lots"})];

	let mut errs = AggregatedError::new();
	let mut parsed = Vec::new();
	for input in inputs {
		let mut value = Value::zero(&limits);
		if errs.add(map(&mut value, &Value::from_json(input))).is_some() {
			parsed.push(value);
		}
	}

	assert_eq!(parsed.len(), 1);
	assert_eq!(parsed[0].to_json(), json!({"cpu": 2, "memory": 512}));
	assert_eq!(errs.len(), 2);
	assert!(errs.errors().iter().all(|err| matches!(err.root_cause(), MapError::IncompatibleTypes { .. })));

	let err = errs.aggregate().expect_err("two failures");
	let text = err.to_string();
	assert!(text.starts_with("multiple errors:\ncpu: "));
	assert!(text.contains("\nmemory: "));
}
