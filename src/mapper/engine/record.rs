use super::mapping::{ensure_map, snapshot};
use super::outcome::{Outcomes, PendingKeys};
use super::{Mapper, Slot};
use crate::mapper::compat::store_as;
use crate::mapper::{Compatibility, Data, MapError, Path, Result, Type, TypeClass, TypeRef, Value, compatibility, converter};

impl Mapper {
	pub(super) fn assign_to_record(&self, mut dst: Slot<'_>, src: &Value, path: &Path) -> Result<Option<bool>> {
		let dst_ty = dst.value.ty().clone();
		match src.class() {
			TypeClass::Record => {
				if compatibility(src.ty(), &dst_ty) != Compatibility::Assignable {
					return Ok(None);
				}
				dst.set(store_as(src, &dst_ty), path)?;
				Ok(Some(true))
			}
			TypeClass::Mapping => {
				let src_key = src.ty().key().cloned().unwrap_or_else(Type::invalid);
				let Some(key_conv) = converter(&src_key, &Type::string()) else {
					return Ok(None);
				};
				let mut pending = PendingKeys::default();
				for (key, value) in snapshot(src, path)? {
					if let Some(name) = key_conv(&key).and_then(|name| name.as_str().map(str::to_owned)) {
						pending.insert(name, key, value);
					}
				}

				let mut outcomes = Outcomes::default();
				self.fill_record(dst.value, &mut pending, &mut outcomes, path);
				outcomes.into_result()?;
				self.fill_wildcard_mapping(dst.value, src.ty(), &pending, path)?;
				Ok(Some(true))
			}
			_ => self.fill_wildcard_scalar(dst.value, src, path),
		}
	}

	/// Assign pending entries to fields by external name.
	fn fill_record(&self, record: &mut Value, pending: &mut PendingKeys, outcomes: &mut Outcomes, path: &Path) {
		let ty = record.ty().clone();
		let Data::Record(values) = record.data_mut() else {
			return;
		};
		for (field, value) in ty.fields().iter().zip(values.iter_mut()) {
			let info = self.parse_field(field);
			let field_path = path.field(&field.name);
			if (field.embedded || info.squash) && TypeClass::of(&field.ty) == TypeClass::Record {
				self.fill_record(value, pending, outcomes, &field_path);
				continue;
			}
			if !info.is_named() {
				continue;
			}
			let Some(index) = pending.position(&info.name) else {
				continue;
			};

			match self.assign(Slot::writable(value), pending.value(index), &field_path) {
				Ok(assigned) => {
					outcomes.succeeded(&info.name);
					if assigned {
						pending.mark_assigned(index);
					}
				}
				Err(err) => outcomes.failed(&info.name, err),
			}
		}
	}

	/// Copy unmatched entries into the first wildcard mapping field that accepts them.
	fn fill_wildcard_mapping(&self, record: &mut Value, src_ty: &TypeRef, pending: &PendingKeys, path: &Path) -> Result<()> {
		if pending.unassigned().next().is_none() {
			return Ok(());
		}
		let (Some(src_key), Some(src_elem)) = (src_ty.key(), src_ty.elem()) else {
			return Ok(());
		};

		let ty = record.ty().clone();
		let Data::Record(values) = record.data_mut() else {
			return Ok(());
		};
		for (field, value) in ty.fields().iter().zip(values.iter_mut()) {
			if !self.parse_field(field).wildcard {
				continue;
			}
			let (Some(key), Some(elem)) = (field.ty.key(), field.ty.elem()) else {
				continue;
			};
			let (Some(key_conv), Some(elem_conv)) = (converter(src_key, key), converter(src_elem, elem)) else {
				continue;
			};

			let field_path = path.field(&field.name);
			let map = ensure_map(&mut Slot::writable(value), &field_path)?;
			let mut map = map.try_borrow_mut().map_err(|_| MapError::Aliased { path: field_path.to_string() })?;
			for entry in pending.unassigned() {
				if let (Some(key), Some(value)) = (key_conv(&entry.key), elem_conv(&entry.value)) {
					map.insert(key, value);
				}
			}
			break;
		}
		Ok(())
	}

	/// Route a non-container source into the first wildcard field accepting it.
	fn fill_wildcard_scalar(&self, record: &mut Value, src: &Value, path: &Path) -> Result<Option<bool>> {
		let ty = record.ty().clone();
		let Data::Record(values) = record.data_mut() else {
			return Ok(None);
		};
		for (field, value) in ty.fields().iter().zip(values.iter_mut()) {
			if !self.parse_field(field).wildcard {
				continue;
			}
			let mut target = field.ty.clone();
			while let Some(pointee) = target.pointee().cloned() {
				target = pointee;
			}
			let Some(converted) = converter(src.ty(), &target).and_then(|conv| conv(src)) else {
				continue;
			};
			let assigned = self.assign(Slot::writable(value), &converted, &path.field(&field.name))?;
			return Ok(assigned.then_some(true));
		}
		Ok(None)
	}
}
