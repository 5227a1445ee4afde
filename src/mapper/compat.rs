use crate::mapper::value::{round_float, wrap_signed, wrap_unsigned};
use crate::mapper::{Data, IntWidth, Shape, Type, TypeClass, TypeRef, Value};

/// Assignment relationship between two types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
	/// Same representation; the value can be stored as-is.
	Assignable,
	/// A representation-changing conversion exists and is allowed.
	Convertible,
	/// No allowed conversion.
	Incompatible,
}

/// Value conversion built for one `(from, to)` type pair; `None` when a runtime
/// value turns out not to convert.
pub type Converter = Box<dyn Fn(&Value) -> Option<Value>>;

/// Whether a value of type `from` can be stored in a slot of type `to` unchanged.
pub fn assignable(from: &Type, to: &Type) -> bool {
	if TypeClass::of(from) == TypeClass::Invalid {
		return false;
	}
	if from.identical(to) || TypeClass::of(to) == TypeClass::Dynamic {
		return true;
	}
	(!from.is_named() || !to.is_named()) && from.same_underlying(to)
}

/// Whether any conversion from `from` to `to` exists, lossy ones included.
pub fn convertible(from: &Type, to: &Type) -> bool {
	if assignable(from, to) {
		return true;
	}
	if TypeClass::of(from) == TypeClass::Invalid {
		return false;
	}
	if from.same_underlying_ignoring_tags(to) {
		return true;
	}
	if let (Shape::Pointer(a), Shape::Pointer(b)) = (from.shape(), to.shape()) {
		if !from.is_named() && !to.is_named() && a.same_underlying_ignoring_tags(b) {
			return true;
		}
	}

	let from_class = TypeClass::of(from);
	let to_class = TypeClass::of(to);
	if from_class.is_numeric() && to_class.is_numeric() {
		return true;
	}
	if from_class == TypeClass::Complex && to_class == TypeClass::Complex {
		return true;
	}
	if from_class.is_integer() && to_class == TypeClass::String {
		return true;
	}
	(from_class == TypeClass::String && is_byte_sequence(to)) || (is_byte_sequence(from) && to_class == TypeClass::String)
}

/// Decide how a `from` value may be stored into a `to` slot.
///
/// Integer-to-string (code point reinterpretation) and float-to-integer
/// (truncation) conversions exist but are reported as incompatible.
pub fn compatibility(from: &Type, to: &Type) -> Compatibility {
	if assignable(from, to) {
		return Compatibility::Assignable;
	}
	if !convertible(from, to) {
		return Compatibility::Incompatible;
	}

	let from_class = TypeClass::of(from);
	let to_class = TypeClass::of(to);
	if to_class == TypeClass::String && from_class.is_integer() {
		return Compatibility::Incompatible;
	}
	if from_class == TypeClass::Float && to_class.is_integer() {
		return Compatibility::Incompatible;
	}
	Compatibility::Convertible
}

/// Build the value converter for a type pair.
///
/// Dynamic sources that are not statically compatible get a converter that
/// unwraps the held concrete value and checks compatibility once more.
pub fn converter(from: &TypeRef, to: &TypeRef) -> Option<Converter> {
	let to = to.clone();
	match compatibility(from, &to) {
		Compatibility::Assignable => Some(Box::new(move |value| Some(store_as(value, &to)))),
		Compatibility::Convertible => Some(Box::new(move |value| convert(value, &to))),
		Compatibility::Incompatible if TypeClass::of(from) == TypeClass::Dynamic => Some(Box::new(move |value| {
			let concrete = value.concrete()?;
			match compatibility(concrete.ty(), &to) {
				Compatibility::Assignable => Some(store_as(concrete, &to)),
				Compatibility::Convertible => convert(concrete, &to),
				Compatibility::Incompatible => None,
			}
		})),
		Compatibility::Incompatible => None,
	}
}

/// Store an assignable value under the destination type.
pub(crate) fn store_as(value: &Value, to: &TypeRef) -> Value {
	let detached = value.detach();
	if TypeClass::of(to) == TypeClass::Dynamic {
		if detached.class() == TypeClass::Dynamic {
			return detached.retyped(to);
		}
		return Value::new(to.clone(), Data::Dynamic(Some(Box::new(detached))));
	}
	detached.retyped(to)
}

/// Apply the representation change from `value`'s type to `to`.
///
/// Integers wrap to the destination width and floats round to it, matching
/// plain numeric casts. Returns `None` when no conversion applies.
pub fn convert(value: &Value, to: &TypeRef) -> Option<Value> {
	let data = match (value.data(), to.shape()) {
		(Data::Int(x), Shape::Int(width)) => Data::Int(wrap_signed(*x, *width)),
		(Data::Int(x), Shape::Uint(width)) => Data::Uint(wrap_unsigned(*x as u64, *width)),
		(Data::Int(x), Shape::Float(width)) => Data::Float(round_float(*x as f64, *width)),
		(Data::Uint(x), Shape::Int(width)) => Data::Int(wrap_signed(*x as i64, *width)),
		(Data::Uint(x), Shape::Uint(width)) => Data::Uint(wrap_unsigned(*x, *width)),
		(Data::Uint(x), Shape::Float(width)) => Data::Float(round_float(*x as f64, *width)),
		(Data::Float(x), Shape::Float(width)) => Data::Float(round_float(*x, *width)),
		(Data::Float(x), Shape::Int(width)) => Data::Int(wrap_signed(*x as i64, *width)),
		(Data::Float(x), Shape::Uint(width)) => Data::Uint(wrap_unsigned(*x as u64, *width)),
		(Data::Complex(re, im), Shape::Complex(width)) => Data::Complex(round_float(*re, *width), round_float(*im, *width)),
		(Data::Int(x), Shape::String) => Data::String(code_point(u32::try_from(*x).ok()).to_string()),
		(Data::Uint(x), Shape::String) => Data::String(code_point(u32::try_from(*x).ok()).to_string()),
		(Data::String(text), Shape::Sequence(elem)) if is_byte(elem) => {
			Data::Sequence(text.bytes().map(|byte| Value::new(elem.clone(), Data::Uint(u64::from(byte)))).collect())
		}
		(Data::Sequence(items), Shape::String) if is_byte_sequence(value.ty()) => {
			let bytes: Vec<u8> = items.iter().filter_map(|item| item.as_u64()).map(|byte| byte as u8).collect();
			Data::String(String::from_utf8_lossy(&bytes).into_owned())
		}
		(Data::Pointer(target), Shape::Pointer(_)) => Data::Pointer(target.clone()),
		_ if value.ty().same_underlying_ignoring_tags(to) => value.detach().data().clone(),
		_ => return None,
	};
	Some(Value::new(to.clone(), data))
}

fn code_point(value: Option<u32>) -> char {
	value.and_then(char::from_u32).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn is_byte(ty: &Type) -> bool {
	matches!(ty.shape(), Shape::Uint(IntWidth::W8))
}

fn is_byte_sequence(ty: &Type) -> bool {
	matches!(ty.shape(), Shape::Sequence(elem) if is_byte(elem))
}
