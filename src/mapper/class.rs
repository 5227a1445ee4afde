use crate::mapper::{Shape, Type};

/// Coarse classification of a type's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
	/// Absent value.
	Invalid,
	/// Boolean.
	Bool,
	/// Signed integer of any width.
	Int,
	/// Unsigned integer of any width.
	Uint,
	/// Floating point of any width.
	Float,
	/// Complex of any width.
	Complex,
	/// Sequence.
	Sequence,
	/// Channel.
	Channel,
	/// Function.
	Function,
	/// Open dynamic slot.
	Dynamic,
	/// Mapping.
	Mapping,
	/// Pointer.
	Pointer,
	/// String.
	String,
	/// Record.
	Record,
	/// Raw pointer.
	RawPointer,
}

impl TypeClass {
	/// Classify a type by its shape.
	pub fn of(ty: &Type) -> Self {
		match ty.shape() {
			Shape::Invalid => Self::Invalid,
			Shape::Bool => Self::Bool,
			Shape::Int(_) => Self::Int,
			Shape::Uint(_) => Self::Uint,
			Shape::Float(_) => Self::Float,
			Shape::Complex(_) => Self::Complex,
			Shape::Sequence(_) => Self::Sequence,
			Shape::Channel(_) => Self::Channel,
			Shape::Function => Self::Function,
			Shape::Dynamic => Self::Dynamic,
			Shape::Mapping(..) => Self::Mapping,
			Shape::Pointer(_) => Self::Pointer,
			Shape::String => Self::String,
			Shape::Record(_) => Self::Record,
			Shape::RawPointer => Self::RawPointer,
		}
	}

	/// Signed or unsigned integer.
	pub fn is_integer(self) -> bool {
		matches!(self, Self::Int | Self::Uint)
	}

	/// Integer or floating point.
	pub fn is_numeric(self) -> bool {
		matches!(self, Self::Int | Self::Uint | Self::Float)
	}

	/// Mapping or record.
	pub fn is_container(self) -> bool {
		matches!(self, Self::Mapping | Self::Record)
	}
}
