use pretty_assertions::assert_eq;
use serde_json::json;

use super::{Mapper, Slot, map, map_value};
use crate::mapper::{Data, Field, MapError, Shape, TraceLog, Type, TypeRef, Value};

fn doc(json: serde_json::Value) -> Value {
	Value::from_json(json)
}

fn server_ty() -> TypeRef {
	Type::record(
		"Server",
		vec![
			Field::new("Host", Type::string()).tag("json", "host"),
			Field::new("Port", Type::u16()).tag("json", "port"),
			Field::new("Tags", Type::sequence(Type::string())).tag("json", "tags,omitempty"),
		],
	)
}

fn config_ty() -> TypeRef {
	Type::record(
		"Config",
		vec![
			Field::new("Name", Type::string()).tag("json", "name"),
			Field::new("Server", server_ty()).tag("json", "server"),
			Field::new("Ratio", Type::f32()).tag("json", "ratio"),
			Field::new("Debug", Type::pointer(Type::bool())).tag("json", "debug"),
		],
	)
}

fn server(host: &str, port: u16) -> Value {
	Value::record(
		server_ty(),
		vec![Value::string(host), Value::int_of(&Type::u16(), i64::from(port)), Value::sequence(Type::string(), Vec::new())],
	)
}

#[test]
fn scalar_assign_and_convert() {
	let mut int = Value::zero(&Type::i64());
	map(&mut int, &Value::i64(10)).expect("same type");
	assert_eq!(int.as_i64(), Some(10));

	let mut float = Value::zero(&Type::f64());
	map(&mut float, &Value::i64(3)).expect("int widens to float");
	assert_eq!(float.as_f64(), Some(3.0));

	let port = Type::named("Port", Shape::Uint(crate::mapper::IntWidth::W16));
	let mut named = Value::zero(&port);
	map(&mut named, &Value::any(Value::i64(8080))).expect("held int converts to named u16");
	assert_eq!(named.as_u64(), Some(8080));
	assert!(named.ty().identical(&port));
}

#[test]
fn lossy_scalar_paths_fail() {
	let mut int = Value::zero(&Type::i64());
	let err = map(&mut int, &Value::f64(1.5)).expect_err("float to int is refused");
	assert!(matches!(err, MapError::IncompatibleTypes { ref from, ref to, .. } if from == "f64" && to == "i64"));

	let mut text = Value::zero(&Type::string());
	assert!(matches!(map(&mut text, &Value::i64(65)), Err(MapError::IncompatibleTypes { .. })));
	assert_eq!(text.as_str(), Some(""));
}

#[test]
fn absent_source_is_a_noop() {
	let mut int = Value::i64(5);
	map(&mut int, &Value::any_nil()).expect("nil any");
	map(&mut int, &Value::invalid()).expect("invalid source");
	map(&mut int, &Value::nil_pointer(Type::i64())).expect("nil pointer");
	assert_eq!(int.as_i64(), Some(5));
}

#[test]
fn invalid_destination_fails() {
	let mut dst = Value::invalid();
	assert!(matches!(map(&mut dst, &Value::i64(1)), Err(MapError::InvalidValue)));
}

#[test]
fn fixed_slots_refuse_replacement() {
	let mut int = Value::i64(1);
	let err = map_value(Slot::fixed(&mut int), &Value::i64(2)).expect_err("fixed scalar");
	assert!(matches!(err, MapError::NotAllowedToSet { .. }));
	assert_eq!(int.as_i64(), Some(1));

	let mut nil = Value::nil_pointer(Type::i64());
	let err = map_value(Slot::fixed(&mut nil), &Value::i64(2)).expect_err("fixed nil pointer");
	assert!(matches!(err, MapError::NotAllowedToSet { .. }));
}

#[test]
fn record_round_trips_through_document() {
	let config = Value::record(
		config_ty(),
		vec![
			Value::string("svc"),
			server("localhost", 8080),
			Value::f32(0.5),
			Value::pointer_to(Value::bool(true)),
		],
	);

	let mut flat = Value::zero(&Type::document());
	map(&mut flat, &config).expect("record flattens");
	assert_eq!(flat.to_json(), json!({"name": "svc", "server": {"host": "localhost", "port": 8080}, "ratio": 0.5, "debug": true}));

	let mut back = Value::zero(&config_ty());
	map(&mut back, &flat).expect("document maps back");
	assert_eq!(back, config);
}

#[test]
fn mapping_twice_is_idempotent() {
	let source = doc(json!({"name": "svc", "server": {"host": "h", "port": 8080, "tags": ["a", "b"]}, "debug": false}));
	let mut config = Value::zero(&config_ty());
	map(&mut config, &source).expect("first");
	let first = config.to_json();
	map(&mut config, &source).expect("second");
	assert_eq!(config.to_json(), first);
	assert_eq!(first["server"]["tags"], json!(["a", "b"]));
}

#[test]
fn map_into_record_keeps_unmentioned_fields() {
	let mut config = Value::zero(&config_ty());
	map(&mut config, &doc(json!({"name": "svc", "ratio": 2.0}))).expect("first");
	map(&mut config, &doc(json!({"server": {"port": 9000}}))).expect("second");
	assert_eq!(config.field("Name").and_then(Value::as_str), Some("svc"));
	assert_eq!(config.field("Ratio").and_then(Value::as_f64), Some(2.0));
	assert_eq!(config.field("Server").and_then(|s| s.field("Port")).and_then(Value::as_u64), Some(9000));
}

#[test]
fn nested_documents_merge_accretively() {
	let mut target = Value::zero(&Type::document());
	map(&mut target, &doc(json!({"a": {"x": 1}}))).expect("first");
	map(&mut target, &doc(json!({"a": {"y": 2}, "b": true}))).expect("second");
	assert_eq!(target.to_json(), json!({"a": {"x": 1, "y": 2}, "b": true}));

	let mut open = Value::any_nil();
	map(&mut open, &doc(json!({"a": {"x": 1}}))).expect("first");
	map(&mut open, &doc(json!({"a": {"y": 2}}))).expect("second");
	assert_eq!(open.to_json(), json!({"a": {"x": 1, "y": 2}}));
}

#[test]
fn stored_documents_do_not_alias_the_source() {
	let first = doc(json!({"a": {"x": 1}}));
	let mut target = Value::any_nil();
	map(&mut target, &first).expect("first");
	map(&mut target, &doc(json!({"a": {"y": 2}}))).expect("second");
	assert_eq!(first.to_json(), json!({"a": {"x": 1}}));
}

#[test]
fn float_into_integer_field_is_reported_per_field() {
	let mut srv = Value::zero(&server_ty());
	let err = map(&mut srv, &doc(json!({"host": "h", "port": 1.5}))).expect_err("port must be integral");
	assert!(matches!(err, MapError::Field { ref name, .. } if name == "port"));
	assert!(matches!(err.root_cause(), MapError::IncompatibleTypes { from, to, .. } if from == "f64" && to == "u16"));
	assert_eq!(srv.field("Host").and_then(Value::as_str), Some("h"));
}

fn multi_ty() -> TypeRef {
	Type::record(
		"Multi",
		vec![
			Field::new("Text", Type::string()).tag("json", "v"),
			Field::new("Ptr", Type::pointer(Type::string())).tag("json", "v"),
			Field::new("Num", Type::i64()).tag("json", "v"),
		],
	)
}

#[test]
fn one_matching_field_satisfies_a_shared_name() {
	let mut text = Value::zero(&multi_ty());
	map(&mut text, &doc(json!({"v": "s"}))).expect("text fields accept a string");
	assert_eq!(text.field("Text").and_then(Value::as_str), Some("s"));
	assert_eq!(text.field("Ptr").and_then(Value::deref).and_then(|v| v.as_str().map(str::to_owned)).as_deref(), Some("s"));
	assert_eq!(text.field("Num").and_then(Value::as_i64), Some(0));

	let mut num = Value::zero(&multi_ty());
	map(&mut num, &doc(json!({"v": 101}))).expect("integer field accepts an int");
	assert_eq!(num.field("Num").and_then(Value::as_i64), Some(101));
	assert_eq!(num.field("Text").and_then(Value::as_str), Some(""));
	assert!(num.field("Ptr").is_some_and(Value::is_nil));
}

#[test]
fn shared_name_fails_when_every_field_fails() {
	let mut multi = Value::zero(&multi_ty());
	let err = map(&mut multi, &doc(json!({"v": 3.4}))).expect_err("no field takes a float");
	assert!(matches!(err, MapError::Field { ref name, .. } if name == "v"));
	assert!(matches!(err.root_cause(), MapError::IncompatibleTypes { .. }));
}

#[test]
fn wildcard_scalar_field_catches_plain_sources() {
	let ty = Type::record(
		"Wrapper",
		vec![
			Field::new("Name", Type::string()).tag("json", "name"),
			Field::new("Raw", Type::pointer(Type::i64())).tag("json", "*"),
		],
	);
	let mut wrapper = Value::zero(&ty);
	map(&mut wrapper, &Value::any(Value::i64(7))).expect("int goes to wildcard");
	assert_eq!(wrapper.field("Raw").and_then(Value::deref).and_then(|v| v.as_i64()), Some(7));

	let err = map(&mut wrapper, &Value::string("x")).expect_err("no wildcard accepts text");
	assert!(matches!(err, MapError::IncompatibleTypes { .. }));
}

#[test]
fn wildcard_mapping_field_collects_unmatched_keys() {
	let ty = Type::record(
		"Service",
		vec![
			Field::new("Name", Type::string()).tag("json", "name"),
			Field::new("Extra", Type::document()).tag("json", "*"),
			Field::new("Later", Type::document()).tag("json", "*"),
		],
	);
	let mut service = Value::zero(&ty);
	map(&mut service, &doc(json!({"name": "api", "replicas": 3, "zone": "eu"}))).expect("maps");
	assert_eq!(service.field("Name").and_then(Value::as_str), Some("api"));
	assert_eq!(service.field("Extra").map(Value::to_json), Some(json!({"replicas": 3, "zone": "eu"})));
	assert!(service.field("Later").is_some_and(Value::is_nil));
}

#[test]
fn typed_wildcard_mapping_drops_unconvertible_entries() {
	let ty = Type::record("Counts", vec![Field::new("All", Type::mapping(Type::string(), Type::i64())).tag("json", "*")]);
	let mut counts = Value::zero(&ty);
	map(&mut counts, &doc(json!({"a": 1, "b": "x"}))).expect("unmatched keys are best effort");
	assert_eq!(counts.field("All").map(Value::to_json), Some(json!({"a": 1})));
}

fn item_types() -> (TypeRef, TypeRef, TypeRef) {
	let base = Type::record("Base", vec![Field::new("Id", Type::i64()).tag("json", "id")]);
	let meta = Type::record("Meta", vec![Field::new("Owner", Type::string()).tag("json", "owner")]);
	let item = Type::record(
		"Item",
		vec![
			Field::embedded(base.clone()),
			Field::new("Meta", meta.clone()).tag("json", "meta,squash"),
			Field::new("Title", Type::string()).tag("json", "title"),
			Field::new("Secret", Type::string()).tag("json", "-"),
			Field::new("internal", Type::i64()).private(),
		],
	);
	(base, meta, item)
}

#[test]
fn embedded_and_squashed_fields_read_from_parent_level() {
	let (_, _, item_ty) = item_types();
	let mut item = Value::zero(&item_ty);
	map(&mut item, &doc(json!({"id": 4, "owner": "ann", "title": "t", "Secret": "s", "internal": 9, "meta": {"owner": "x"}}))).expect("maps");
	assert_eq!(item.field("Base").and_then(|b| b.field("Id")).and_then(Value::as_i64), Some(4));
	assert_eq!(item.field("Meta").and_then(|m| m.field("Owner")).and_then(Value::as_str), Some("ann"));
	assert_eq!(item.field("Title").and_then(Value::as_str), Some("t"));
	assert_eq!(item.field("Secret").and_then(Value::as_str), Some(""));
	assert_eq!(item.field("internal").and_then(Value::as_i64), Some(0));
}

#[test]
fn embedded_and_squashed_fields_flatten_to_parent_level() {
	let (base, meta, item_ty) = item_types();
	let item = Value::record(
		item_ty,
		vec![
			Value::record(base, vec![Value::i64(4)]),
			Value::record(meta, vec![Value::string("ann")]),
			Value::string("t"),
			Value::string("s"),
			Value::i64(9),
		],
	);
	let mut flat = Value::zero(&Type::document());
	map(&mut flat, &item).expect("flattens");
	assert_eq!(flat.to_json(), json!({"id": 4, "owner": "ann", "title": "t"}));
}

#[test]
fn pointer_sources_alias_instead_of_copying() {
	let original = Value::pointer_to(server("a", 1));
	let mut alias = Value::nil_pointer(server_ty());
	map(&mut alias, &original).expect("aliases");
	assert!(alias.same_target(&original));

	let target = original.target().expect("allocated");
	if let Some(host) = target.borrow_mut().field_mut("Host") {
		*host = Value::string("b");
	}
	assert_eq!(alias.deref().and_then(|s| s.field("Host").and_then(Value::as_str).map(str::to_owned)).as_deref(), Some("b"));
}

#[test]
fn pointer_field_aliases_source_pointer() {
	let ty = Type::record("Holder", vec![Field::new("Srv", Type::pointer(server_ty())).tag("json", "srv")]);
	let shared = Value::pointer_to(server("a", 1));
	let mut holder = Value::zero(&ty);
	map(&mut holder, &Value::document([("srv", shared.clone())])).expect("maps");
	assert!(holder.field("Srv").is_some_and(|srv| srv.same_target(&shared)));
}

#[test]
fn fixed_pointer_writes_through_to_shared_target() {
	let shared = Value::pointer_to(server("a", 1));
	let mut alias = shared.clone();
	let other = Value::pointer_to(server("b", 2));

	map_value(Slot::fixed(&mut alias), &other).expect("copies into target");
	assert!(alias.same_target(&shared));
	assert!(!shared.same_target(&other));
	assert_eq!(shared.deref(), other.deref());

	let target = other.target().expect("allocated");
	if let Some(host) = target.borrow_mut().field_mut("Host") {
		*host = Value::string("c");
	}
	assert_eq!(shared.deref().and_then(|s| s.field("Host").and_then(Value::as_str).map(str::to_owned)).as_deref(), Some("b"));
}

#[test]
fn pointer_onto_own_target_is_a_noop() {
	let shared = Value::pointer_to(Value::i64(3));
	let mut alias = shared.clone();
	map_value(Slot::fixed(&mut alias), &shared).expect("same target");
	assert_eq!(shared.deref().and_then(|v| v.as_i64()), Some(3));
}

#[test]
fn nil_pointer_destination_allocates_only_on_assignment() {
	let mut ptr = Value::nil_pointer(Type::i64());
	map(&mut ptr, &Value::i64(4)).expect("allocates");
	assert_eq!(ptr.deref().and_then(|v| v.as_i64()), Some(4));

	let mut seq_ptr = Value::nil_pointer(Type::sequence(Type::i64()));
	map(&mut seq_ptr, &Value::sequence(Type::dynamic(), Vec::new())).expect("empty sequence");
	assert!(seq_ptr.is_nil());
}

#[test]
fn record_source_pointer_is_dereferenced() {
	let mut srv = Value::zero(&server_ty());
	map(&mut srv, &Value::pointer_to(server("h", 7))).expect("referent is assignable");
	assert_eq!(srv, server("h", 7));
}

#[test]
fn distinct_record_types_do_not_mix() {
	let other = Type::record(
		"Endpoint",
		vec![
			Field::new("Host", Type::string()).tag("json", "host"),
			Field::new("Port", Type::u16()).tag("json", "port"),
			Field::new("Tags", Type::sequence(Type::string())).tag("json", "tags,omitempty"),
		],
	);
	let mut endpoint = Value::zero(&other);
	assert!(matches!(map(&mut endpoint, &server("h", 1)), Err(MapError::IncompatibleTypes { .. })));
}

#[test]
fn sequences_are_rebuilt_elementwise() {
	let mut ints = Value::zero(&Type::sequence(Type::i64()));
	map(&mut ints, &doc(json!({"v": [1, 2, 3]})).get("v").expect("present")).expect("maps");
	assert_eq!(ints.to_json(), json!([1, 2, 3]));

	let err = map(&mut ints, &doc(json!({"v": [1, "x"]})).get("v").expect("present")).expect_err("second element fails");
	assert!(matches!(err, MapError::IncompatibleTypes { ref path, .. } if path == "[1]"));
	assert_eq!(ints.to_json(), json!([1, 2, 3]));
}

#[test]
fn empty_source_sequence_keeps_destination() {
	let mut ints = Value::sequence(Type::i64(), vec![Value::i64(9)]);
	map(&mut ints, &Value::sequence(Type::dynamic(), Vec::new())).expect("no-op");
	assert_eq!(ints.to_json(), json!([9]));
}

#[test]
fn mapping_keys_must_convert() {
	let mut by_id = Value::zero(&Type::mapping(Type::i64(), Type::string()));
	let err = map(&mut by_id, &doc(json!({"1": "a"}))).expect_err("string keys do not become ints");
	assert!(matches!(err, MapError::KeyTypeMismatch { ref from, ref to, .. } if from == "string" && to == "i64"));

	let ints = Value::mapping(Type::mapping(Type::i64(), Type::string()), [(Value::i64(1), Value::string("a"))]);
	let mut by_float = Value::zero(&Type::mapping(Type::f64(), Type::string()));
	map(&mut by_float, &ints).expect("int keys widen");
	let stored = by_float.map_ref().expect("allocated").borrow().get(&Value::f64(1.0)).cloned();
	assert_eq!(stored.and_then(|v| v.as_str().map(str::to_owned)).as_deref(), Some("a"));

	let mut doc_dst = Value::zero(&Type::document());
	assert!(matches!(map(&mut doc_dst, &ints), Err(MapError::KeyTypeMismatch { .. })));
}

#[test]
fn empty_source_mapping_allocates_destination() {
	let mut target = Value::zero(&Type::document());
	map(&mut target, &Value::document([])).expect("empty");
	assert!(!target.is_nil());
	assert_eq!(target.len(), 0);
}

#[test]
fn record_into_typed_mapping_is_incompatible() {
	let mut strings = Value::zero(&Type::mapping(Type::string(), Type::string()));
	assert!(matches!(map(&mut strings, &server("h", 1)), Err(MapError::IncompatibleTypes { .. })));
}

#[test]
fn dynamic_slots_hold_and_release_pointers() {
	let shared = Value::pointer_to(server("h", 1));
	let mut open = Value::any_nil();
	map(&mut open, &shared).expect("stores pointer");
	assert!(open.same_target(&shared));

	let mut ptr = Value::nil_pointer(server_ty());
	map(&mut ptr, &open).expect("unwraps and aliases");
	assert!(ptr.same_target(&shared));
}

#[test]
fn fixed_dynamic_slot_merges_into_held_record() {
	let mut open = Value::any(server("h", 1));
	map_value(Slot::fixed(&mut open), &doc(json!({"port": 2}))).expect("merges into held record");
	assert_eq!(open.to_json(), json!({"host": "h", "port": 2}));
}

#[test]
fn channels_and_functions_are_shared_handles() {
	let source = Value::channel(Type::i64());
	let mut chan = Value::zero(&Type::channel(Type::i64()));
	map(&mut chan, &source).expect("channel");
	assert_eq!(chan, source);

	let mut ptr = Value::nil_pointer(Type::channel(Type::i64()));
	let chan_ptr = Value::pointer_to(source);
	map(&mut ptr, &chan_ptr).expect("channel pointer");
	assert!(ptr.same_target(&chan_ptr));

	let mut func = Value::zero(&Type::function());
	map(&mut func, &Value::function(|args| args.to_vec())).expect("function");
	let Data::Function(Some(f)) = func.data() else {
		panic!("function stored");
	};
	assert_eq!(f.call(&[Value::i64(1)]), vec![Value::i64(1)]);
}

#[test]
fn aliased_target_is_reported() {
	let node = Type::record("Node", vec![Field::new("V", Type::dynamic()).tag("json", "v")]);
	let shared = Value::pointer_to(Value::zero(&node));
	let mut alias = shared.clone();
	let err = map(&mut alias, &Value::document([("v", shared.clone())])).expect_err("source reads the target being written");
	assert!(matches!(err.root_cause(), MapError::Aliased { .. }));
}

#[test]
fn configured_tags_are_probed_in_order() {
	let ty = Type::record("Listen", vec![Field::new("Addr", Type::string()).tag("yaml", "listen").tag("json", "addr")]);
	let mapper = Mapper::new().with_field_tags(["yaml", "json"]);
	let mut listen = Value::zero(&ty);
	mapper.map(&mut listen, &doc(json!({"listen": "0.0.0.0", "addr": "ignored"}))).expect("maps");
	assert_eq!(listen.field("Addr").and_then(Value::as_str), Some("0.0.0.0"));
}

#[test]
fn trace_hook_sees_every_step() {
	let log = TraceLog::new();
	let mapper = Mapper::new().with_trace(log.hook());
	let mut srv = Value::zero(&server_ty());
	mapper.map(&mut srv, &doc(json!({"host": "h", "port": 1}))).expect("maps");

	let events = log.events();
	assert_eq!(events[0].path, "");
	assert_eq!(events[0].dst, "Server");
	assert!(events.iter().any(|event| event.path == "Port" && event.dst == "u16" && event.src == "any"));
}
