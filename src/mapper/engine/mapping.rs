use std::cell::RefCell;
use std::rc::Rc;

use super::outcome::Outcomes;
use super::{Mapper, Slot, is_container_deep};
use crate::mapper::{Converter, Data, MapError, MapRef, Mapping, Path, Result, Type, TypeClass, TypeRef, Value, converter};

impl Mapper {
	pub(super) fn assign_to_mapping(&self, mut dst: Slot<'_>, src: &Value, path: &Path) -> Result<Option<bool>> {
		let dst_ty = dst.value.ty().clone();
		let (Some(dst_key), Some(dst_elem)) = (dst_ty.key(), dst_ty.elem()) else {
			return Err(MapError::InvalidValue);
		};

		match src.class() {
			TypeClass::Mapping => {
				let src_key = src.ty().key().cloned().unwrap_or_else(Type::invalid);
				let key_conv = converter(&src_key, dst_key).ok_or_else(|| MapError::key_mismatch(&src_key, dst_key, path.as_str()))?;
				let entries = snapshot(src, path)?;
				let map = ensure_map(&mut dst, path)?;

				let mut outcomes = Outcomes::default();
				for (key, value) in entries {
					let name = key.to_string();
					let Some(key) = key_conv(&key) else {
						outcomes.failed(&name, MapError::key_mismatch(&src_key, dst_key, path.as_str()));
						continue;
					};
					let result = self.merge_entry(&map, key, &value, dst_elem, path);
					outcomes.record(&name, result);
				}
				outcomes.into_result()?;
				Ok(Some(true))
			}
			TypeClass::Record if TypeClass::of(dst_elem) == TypeClass::Dynamic => {
				let string = Type::string();
				let key_conv = converter(&string, dst_key).ok_or_else(|| MapError::key_mismatch(&string, dst_key, path.as_str()))?;
				let map = ensure_map(&mut dst, path)?;

				let mut outcomes = Outcomes::default();
				self.flatten_record(&map, src, &key_conv, &mut outcomes, path);
				outcomes.into_result()?;
				Ok(Some(true))
			}
			_ => Ok(None),
		}
	}

	/// Store one source entry, merging into an existing container at the same key.
	fn merge_entry(&self, map: &MapRef, key: Value, value: &Value, elem: &TypeRef, path: &Path) -> Result<()> {
		let entry_path = path.key(&key);
		{
			let mut guard = map.try_borrow_mut().map_err(|_| MapError::Aliased { path: path.to_string() })?;
			if let Some(existing) = guard.get_mut(&key) {
				if is_container_deep(existing) && is_container_deep(value) {
					return self.assign(Slot::writable(existing), value, &entry_path).map(|_| ());
				}
			}
		}

		let mut fresh = Value::zero(elem);
		self.assign(Slot::writable(&mut fresh), value, &entry_path)?;
		map.try_borrow_mut()
			.map_err(|_| MapError::Aliased { path: path.to_string() })?
			.insert(key, fresh);
		Ok(())
	}

	/// Flatten record fields into `map`, recursing into embedded and squashed records.
	pub(super) fn flatten_record(&self, map: &MapRef, src: &Value, key_conv: &Converter, outcomes: &mut Outcomes, path: &Path) {
		let Data::Record(values) = src.data() else {
			return;
		};
		for (field, value) in src.ty().fields().iter().zip(values) {
			let info = self.parse_field(field);
			let field_path = path.field(&field.name);

			let stored = if TypeClass::of(&field.ty) == TypeClass::Record {
				if field.embedded || info.squash {
					self.flatten_record(map, value, key_conv, outcomes, &field_path);
					continue;
				}
				if !info.is_named() {
					continue;
				}
				self.flatten_nested(value, &field_path)
			} else {
				if !info.is_named() || (info.omit_empty && value.is_empty()) {
					continue;
				}
				let mut holder = Value::any_nil();
				self.assign(Slot::writable(&mut holder), value, &field_path).map(|_| holder)
			};

			let result = stored.and_then(|stored| {
				let key = key_conv(&Value::string(info.name.as_str())).ok_or_else(|| MapError::key_mismatch(Type::string(), "key", field_path.as_str()))?;
				map.try_borrow_mut()
					.map_err(|_| MapError::Aliased { path: field_path.to_string() })?
					.insert(key, stored);
				Ok(())
			});
			outcomes.record(&info.name, result);
		}
	}

	/// Nested record flattened into its own `{string: any}` mapping.
	fn flatten_nested(&self, value: &Value, path: &Path) -> Result<Value> {
		let nested: MapRef = Rc::new(RefCell::new(Mapping::new()));
		let string = Type::string();
		let key_conv: Converter = Box::new(move |key: &Value| Some(key.clone().retyped(&string)));
		let mut outcomes = Outcomes::default();
		self.flatten_record(&nested, value, &key_conv, &mut outcomes, path);
		outcomes.into_result()?;
		Ok(Value::any(Value::new(Type::document(), Data::Mapping(Some(nested)))))
	}
}

pub(super) fn snapshot(src: &Value, path: &Path) -> Result<Vec<(Value, Value)>> {
	match src.data() {
		Data::Mapping(Some(map)) => map
			.try_borrow()
			.map(|map| map.iter().map(|(key, value)| (key.clone(), value.clone())).collect())
			.map_err(|_| MapError::Aliased { path: path.to_string() }),
		_ => Ok(Vec::new()),
	}
}

/// Existing mapping storage of `dst`, allocating it when unset.
pub(super) fn ensure_map(dst: &mut Slot<'_>, path: &Path) -> Result<MapRef> {
	if let Data::Mapping(Some(map)) = dst.value.data() {
		return Ok(Rc::clone(map));
	}
	let map: MapRef = Rc::new(RefCell::new(Mapping::new()));
	let ty = dst.value.ty().clone();
	dst.set(Value::new(ty, Data::Mapping(Some(Rc::clone(&map)))), path)?;
	Ok(map)
}
