use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::mapper::compat::store_as;
use crate::mapper::field::DEFAULT_FIELD_TAG;
use crate::mapper::{Compatibility, Data, Field, FieldInfo, MapError, Path, Pointer, Result, TraceHook, TypeClass, Value, compatibility, convert, parse_field};

mod mapping;
mod outcome;
mod record;

/// Destination handle: a value plus whether the slot itself may be replaced.
///
/// A fixed slot can still be mutated through its interior: pointer targets,
/// mapping entries, record fields, and held dynamic values.
pub struct Slot<'a> {
	value: &'a mut Value,
	writable: bool,
}

impl<'a> Slot<'a> {
	/// Slot that may be overwritten wholesale.
	pub fn writable(value: &'a mut Value) -> Self {
		Self { value, writable: true }
	}

	/// Slot whose identity must be preserved.
	pub fn fixed(value: &'a mut Value) -> Self {
		Self { value, writable: false }
	}

	/// Current value.
	pub fn value(&self) -> &Value {
		self.value
	}

	/// Whether the slot may be overwritten.
	pub fn is_writable(&self) -> bool {
		self.writable
	}

	fn reborrow(&mut self) -> Slot<'_> {
		Slot {
			value: &mut *self.value,
			writable: self.writable,
		}
	}

	fn set(&mut self, value: Value, path: &Path) -> Result<()> {
		if !self.writable {
			return Err(MapError::NotAllowedToSet { path: path.to_string() });
		}
		*self.value = value;
		Ok(())
	}
}

/// Assignment engine configuration.
pub struct Mapper {
	field_tags: Vec<String>,
	trace: Option<TraceHook>,
}

impl Default for Mapper {
	fn default() -> Self {
		Self {
			field_tags: vec![DEFAULT_FIELD_TAG.to_owned()],
			trace: None,
		}
	}
}

impl fmt::Debug for Mapper {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Mapper")
			.field("field_tags", &self.field_tags)
			.field("trace", &self.trace.is_some())
			.finish()
	}
}

impl Mapper {
	/// Mapper probing the `json` annotation key.
	pub fn new() -> Self {
		Self::default()
	}

	/// Replace the ordered annotation keys probed on each field.
	pub fn with_field_tags<I, S>(mut self, tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.field_tags = tags.into_iter().map(Into::into).collect();
		self
	}

	/// Install a hook observing every assignment step.
	pub fn with_trace(mut self, hook: TraceHook) -> Self {
		self.trace = Some(hook);
		self
	}

	/// Annotation keys in probe order.
	pub fn field_tags(&self) -> &[String] {
		&self.field_tags
	}

	/// Parse a field with this mapper's annotation keys.
	pub fn parse_field(&self, field: &Field) -> FieldInfo {
		parse_field(field, &self.field_tags)
	}

	/// Assign `src` into a pre-resolved destination handle.
	pub fn map_value(&self, dst: Slot<'_>, src: &Value) -> Result<()> {
		self.assign(dst, src, &Path::root()).map(|_| ())
	}

	/// Assign `src` into `dst`, which may be replaced wholesale.
	pub fn map(&self, dst: &mut Value, src: &Value) -> Result<()> {
		self.map_value(Slot::writable(dst), src)
	}

	/// Recursive step. `Ok(false)` means no rule applied and nothing was stored.
	pub(crate) fn assign(&self, mut dst: Slot<'_>, src: &Value, path: &Path) -> Result<bool> {
		if let Some(hook) = &self.trace {
			hook(dst.value, src, path);
		}
		trace!(path = %path, dst = %dst.value.ty(), src = %src.ty(), "assign");

		if dst.value.class() == TypeClass::Invalid {
			return Err(MapError::InvalidValue);
		}
		let Some(src) = src.concrete() else {
			return Ok(false);
		};
		if !src.is_valid() {
			return Ok(false);
		}

		let outcome = match dst.value.class() {
			TypeClass::Pointer => return self.assign_to_pointer(dst, src, path),
			TypeClass::Dynamic => return self.assign_to_dynamic(dst, src, path),
			TypeClass::Sequence => self.assign_to_sequence(dst.reborrow(), src, path)?,
			TypeClass::Mapping => self.assign_to_mapping(dst.reborrow(), src, path)?,
			TypeClass::Record => self.assign_to_record(dst.reborrow(), src, path)?,
			_ => self.assign_scalar(dst.reborrow(), src, path)?,
		};
		if let Some(assigned) = outcome {
			return Ok(assigned);
		}

		match src.data() {
			Data::Pointer(Some(target)) => {
				let referent = read_target(target, path)?;
				self.assign(dst, &referent, path)
			}
			Data::Pointer(None) => Ok(false),
			_ => Err(MapError::incompatible(src.ty(), dst.value.ty(), path.as_str())),
		}
	}

	fn assign_to_pointer(&self, mut dst: Slot<'_>, src: &Value, path: &Path) -> Result<bool> {
		let dst_ty = dst.value.ty().clone();
		if dst.writable && compatibility(src.ty(), &dst_ty) != Compatibility::Incompatible {
			if let Some(value) = coerce(src, &dst_ty) {
				dst.set(value, path)?;
				return Ok(true);
			}
		}

		if let Data::Pointer(Some(target)) = dst.value.data() {
			let target = Rc::clone(target);
			if let Data::Pointer(Some(src_target)) = src.data() {
				if Rc::ptr_eq(&target, src_target) {
					return Ok(true);
				}
			}
			let mut inner = target.try_borrow_mut().map_err(|_| MapError::Aliased { path: path.to_string() })?;
			return self.assign(Slot::writable(&mut inner), src, &path.deref());
		}

		if !dst.writable {
			return Err(MapError::NotAllowedToSet { path: path.to_string() });
		}
		let pointee = dst_ty.pointee().cloned().ok_or(MapError::InvalidValue)?;
		let mut fresh = Value::zero(&pointee);
		let assigned = self.assign(Slot::writable(&mut fresh), src, &path.deref())?;
		if assigned {
			dst.set(Value::pointer_from(dst_ty, Rc::new(RefCell::new(fresh))), path)?;
		}
		Ok(assigned)
	}

	fn assign_to_dynamic(&self, mut dst: Slot<'_>, src: &Value, path: &Path) -> Result<bool> {
		if let Some(container) = source_container(src, path)? {
			if let Some(assigned) = self.merge_into_held(dst.value, &container, &path.merge())? {
				return Ok(assigned);
			}
		}

		if !dst.writable {
			if let Data::Dynamic(Some(held)) = dst.value.data_mut() {
				return self.assign(Slot::fixed(held), src, &path.dynamic());
			}
			return Err(MapError::NotAllowedToSet { path: path.to_string() });
		}

		Ok(self.assign_scalar(dst, src, path)?.unwrap_or(false))
	}

	/// Merge `src` into the container reached through `held`'s dynamic and
	/// pointer layers; `None` when `held` does not lead to a container.
	fn merge_into_held(&self, held: &mut Value, src: &Value, path: &Path) -> Result<Option<bool>> {
		let class = held.class();
		match held.data_mut() {
			Data::Dynamic(Some(inner)) => return self.merge_into_held(inner, src, path),
			Data::Pointer(Some(target)) => {
				let target = Rc::clone(target);
				let mut inner = target.try_borrow_mut().map_err(|_| MapError::Aliased { path: path.to_string() })?;
				return self.merge_into_held(&mut inner, src, &path.deref());
			}
			_ => {}
		}
		if class.is_container() {
			return self.assign(Slot::writable(held), src, path).map(Some);
		}
		Ok(None)
	}

	fn assign_to_sequence(&self, mut dst: Slot<'_>, src: &Value, path: &Path) -> Result<Option<bool>> {
		let Data::Sequence(items) = src.data() else {
			return Ok(None);
		};
		let dst_ty = dst.value.ty().clone();
		let elem = dst_ty.elem().cloned().ok_or(MapError::InvalidValue)?;

		let mut out = Vec::with_capacity(items.len());
		let mut assigned = false;
		for (index, item) in items.iter().enumerate() {
			let mut slot = Value::zero(&elem);
			assigned |= self.assign(Slot::writable(&mut slot), item, &path.index(index))?;
			out.push(slot);
		}
		if assigned {
			dst.set(Value::new(dst_ty, Data::Sequence(out)), path)?;
		}
		Ok(Some(assigned))
	}

	fn assign_scalar(&self, mut dst: Slot<'_>, src: &Value, path: &Path) -> Result<Option<bool>> {
		let dst_ty = dst.value.ty().clone();
		let Some(value) = coerce(src, &dst_ty) else {
			return Ok(None);
		};
		dst.set(value, path)?;
		Ok(Some(true))
	}
}

/// Assign `src` into `dst` using a default [`Mapper`].
pub fn map(dst: &mut Value, src: &Value) -> Result<()> {
	Mapper::default().map(dst, src)
}

/// Assign `src` into a pre-resolved handle using a default [`Mapper`].
pub fn map_value(dst: Slot<'_>, src: &Value) -> Result<()> {
	Mapper::default().map_value(dst, src)
}

/// Store or convert `src` as a value of type `to`, if allowed.
fn coerce(src: &Value, to: &crate::mapper::TypeRef) -> Option<Value> {
	match compatibility(src.ty(), to) {
		Compatibility::Assignable => Some(store_as(src, to)),
		Compatibility::Convertible => convert(src, to),
		Compatibility::Incompatible => None,
	}
}

fn read_target(target: &Pointer, path: &Path) -> Result<Value> {
	target
		.try_borrow()
		.map(|value| value.clone())
		.map_err(|_| MapError::Aliased { path: path.to_string() })
}

/// Follow pointer and dynamic layers of a source down to a mapping or record.
fn source_container(src: &Value, path: &Path) -> Result<Option<Value>> {
	match src.data() {
		Data::Dynamic(Some(inner)) => source_container(inner, path),
		Data::Pointer(Some(target)) => source_container(&read_target(target, path)?, path),
		_ if src.class().is_container() => Ok(Some(src.clone())),
		_ => Ok(None),
	}
}

/// Whether a value reaches a mapping or record through its pointer and dynamic layers.
fn is_container_deep(value: &Value) -> bool {
	match value.data() {
		Data::Dynamic(Some(inner)) => is_container_deep(inner),
		Data::Pointer(Some(target)) => target.try_borrow().map(|inner| is_container_deep(&inner)).unwrap_or(false),
		_ => value.class().is_container(),
	}
}

#[cfg(test)]
mod tests;
