use std::fmt;
use std::rc::Rc;

/// Shared handle to a type descriptor.
pub type TypeRef = Rc<Type>;

/// Storage width of an integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
	/// 8-bit storage.
	W8,
	/// 16-bit storage.
	W16,
	/// 32-bit storage.
	W32,
	/// 64-bit storage.
	W64,
}

impl IntWidth {
	/// Number of storage bits.
	pub fn bits(self) -> u32 {
		match self {
			Self::W8 => 8,
			Self::W16 => 16,
			Self::W32 => 32,
			Self::W64 => 64,
		}
	}
}

/// Storage width of a floating-point (or complex component) type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
	/// Single precision.
	W32,
	/// Double precision.
	W64,
}

/// Structural shape of a type.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
	/// No representable type; the type of an absent value.
	Invalid,
	/// Boolean.
	Bool,
	/// Signed integer.
	Int(IntWidth),
	/// Unsigned integer.
	Uint(IntWidth),
	/// Floating point.
	Float(FloatWidth),
	/// Complex number with components of the given width.
	Complex(FloatWidth),
	/// UTF-8 text.
	String,
	/// Growable sequence of elements.
	Sequence(TypeRef),
	/// Channel carrying elements.
	Channel(TypeRef),
	/// Opaque callable.
	Function,
	/// Open slot accepting any concrete type.
	Dynamic,
	/// Key/value mapping.
	Mapping(TypeRef, TypeRef),
	/// Shared reference to a target of the pointee type.
	Pointer(TypeRef),
	/// Fixed-shape aggregate of named fields.
	Record(Vec<Field>),
	/// Untyped address.
	RawPointer,
}

/// Type descriptor: an optional declared name over a structural shape.
#[derive(Debug, Clone)]
pub struct Type {
	name: Option<Box<str>>,
	shape: Shape,
}

/// One record field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
	/// Declared field name; embedded fields are named after their type.
	pub name: Box<str>,
	/// Declared field type.
	pub ty: TypeRef,
	/// Whether the field is an embedded (anonymous) record.
	pub embedded: bool,
	/// Whether the field is visible to the mapper.
	pub public: bool,
	/// Annotation pairs in declaration order.
	pub tags: Vec<(Box<str>, Box<str>)>,
}

impl Field {
	/// Declare a public named field without annotations.
	pub fn new(name: &str, ty: TypeRef) -> Self {
		Self {
			name: name.into(),
			ty,
			embedded: false,
			public: true,
			tags: Vec::new(),
		}
	}

	/// Declare an embedded record field named after its type.
	pub fn embedded(ty: TypeRef) -> Self {
		let name = ty.name().unwrap_or_default().into();
		Self {
			name,
			ty,
			embedded: true,
			public: true,
			tags: Vec::new(),
		}
	}

	/// Add one annotation, e.g. `("json", "name,omitempty")`.
	pub fn tag(mut self, key: &str, value: &str) -> Self {
		self.tags.push((key.into(), value.into()));
		self
	}

	/// Hide the field from the mapper.
	pub fn private(mut self) -> Self {
		self.public = false;
		self
	}

	/// Return the first annotation value stored under `key`.
	pub fn tag_value(&self, key: &str) -> Option<&str> {
		self.tags.iter().find(|(k, _)| k.as_ref() == key).map(|(_, v)| v.as_ref())
	}
}

impl Type {
	/// Build an unnamed type from a shape.
	pub fn new(shape: Shape) -> TypeRef {
		Rc::new(Self { name: None, shape })
	}

	/// Declare a named type over `shape`.
	pub fn named(name: &str, shape: Shape) -> TypeRef {
		Rc::new(Self {
			name: Some(name.into()),
			shape,
		})
	}

	/// Declare a named record type.
	pub fn record(name: &str, fields: Vec<Field>) -> TypeRef {
		Self::named(name, Shape::Record(fields))
	}

	/// Type of an absent value.
	pub fn invalid() -> TypeRef {
		Self::new(Shape::Invalid)
	}

	/// `bool`.
	pub fn bool() -> TypeRef {
		Self::new(Shape::Bool)
	}

	/// `i8`.
	pub fn i8() -> TypeRef {
		Self::new(Shape::Int(IntWidth::W8))
	}

	/// `i16`.
	pub fn i16() -> TypeRef {
		Self::new(Shape::Int(IntWidth::W16))
	}

	/// `i32`.
	pub fn i32() -> TypeRef {
		Self::new(Shape::Int(IntWidth::W32))
	}

	/// `i64`.
	pub fn i64() -> TypeRef {
		Self::new(Shape::Int(IntWidth::W64))
	}

	/// `u8`.
	pub fn u8() -> TypeRef {
		Self::new(Shape::Uint(IntWidth::W8))
	}

	/// `u16`.
	pub fn u16() -> TypeRef {
		Self::new(Shape::Uint(IntWidth::W16))
	}

	/// `u32`.
	pub fn u32() -> TypeRef {
		Self::new(Shape::Uint(IntWidth::W32))
	}

	/// `u64`.
	pub fn u64() -> TypeRef {
		Self::new(Shape::Uint(IntWidth::W64))
	}

	/// `f32`.
	pub fn f32() -> TypeRef {
		Self::new(Shape::Float(FloatWidth::W32))
	}

	/// `f64`.
	pub fn f64() -> TypeRef {
		Self::new(Shape::Float(FloatWidth::W64))
	}

	/// `complex64`.
	pub fn complex64() -> TypeRef {
		Self::new(Shape::Complex(FloatWidth::W32))
	}

	/// `complex128`.
	pub fn complex128() -> TypeRef {
		Self::new(Shape::Complex(FloatWidth::W64))
	}

	/// `string`.
	pub fn string() -> TypeRef {
		Self::new(Shape::String)
	}

	/// `any`.
	pub fn dynamic() -> TypeRef {
		Self::new(Shape::Dynamic)
	}

	/// `[elem]`.
	pub fn sequence(elem: TypeRef) -> TypeRef {
		Self::new(Shape::Sequence(elem))
	}

	/// `{key: elem}`.
	pub fn mapping(key: TypeRef, elem: TypeRef) -> TypeRef {
		Self::new(Shape::Mapping(key, elem))
	}

	/// `*pointee`.
	pub fn pointer(pointee: TypeRef) -> TypeRef {
		Self::new(Shape::Pointer(pointee))
	}

	/// `chan elem`.
	pub fn channel(elem: TypeRef) -> TypeRef {
		Self::new(Shape::Channel(elem))
	}

	/// Opaque callable.
	pub fn function() -> TypeRef {
		Self::new(Shape::Function)
	}

	/// Untyped address.
	pub fn raw_pointer() -> TypeRef {
		Self::new(Shape::RawPointer)
	}

	/// Generic document mapping `{string: any}`.
	pub fn document() -> TypeRef {
		Self::mapping(Self::string(), Self::dynamic())
	}

	/// Declared name, if any.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Structural shape.
	pub fn shape(&self) -> &Shape {
		&self.shape
	}

	/// Whether the type carries a declared name.
	pub fn is_named(&self) -> bool {
		self.name.is_some()
	}

	/// Record fields, or an empty slice for other shapes.
	pub fn fields(&self) -> &[Field] {
		match &self.shape {
			Shape::Record(fields) => fields,
			_ => &[],
		}
	}

	/// Pointee type of a pointer.
	pub fn pointee(&self) -> Option<&TypeRef> {
		match &self.shape {
			Shape::Pointer(inner) => Some(inner),
			_ => None,
		}
	}

	/// Element type of a sequence, channel, or mapping.
	pub fn elem(&self) -> Option<&TypeRef> {
		match &self.shape {
			Shape::Sequence(elem) | Shape::Channel(elem) | Shape::Mapping(_, elem) => Some(elem),
			_ => None,
		}
	}

	/// Key type of a mapping.
	pub fn key(&self) -> Option<&TypeRef> {
		match &self.shape {
			Shape::Mapping(key, _) => Some(key),
			_ => None,
		}
	}

	/// Same name and structurally identical shape.
	pub fn identical(&self, other: &Type) -> bool {
		std::ptr::eq(self, other) || (self.name == other.name && self.shape == other.shape)
	}

	/// Structurally identical shapes, ignoring the outer names.
	pub fn same_underlying(&self, other: &Type) -> bool {
		self.shape == other.shape
	}

	/// Structurally identical shapes, ignoring outer names and record field tags.
	pub(crate) fn same_underlying_ignoring_tags(&self, other: &Type) -> bool {
		match (&self.shape, &other.shape) {
			(Shape::Record(a), Shape::Record(b)) => {
				a.len() == b.len()
					&& a.iter()
						.zip(b)
						.all(|(x, y)| x.name == y.name && x.embedded == y.embedded && x.public == y.public && x.ty.identical(&y.ty))
			}
			_ => self.shape == other.shape,
		}
	}
}

impl PartialEq for Type {
	fn eq(&self, other: &Self) -> bool {
		self.identical(other)
	}
}

impl fmt::Display for Type {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if let Some(name) = &self.name {
			return f.write_str(name);
		}
		match &self.shape {
			Shape::Invalid => f.write_str("invalid"),
			Shape::Bool => f.write_str("bool"),
			Shape::Int(width) => write!(f, "i{}", width.bits()),
			Shape::Uint(width) => write!(f, "u{}", width.bits()),
			Shape::Float(FloatWidth::W32) => f.write_str("f32"),
			Shape::Float(FloatWidth::W64) => f.write_str("f64"),
			Shape::Complex(FloatWidth::W32) => f.write_str("complex64"),
			Shape::Complex(FloatWidth::W64) => f.write_str("complex128"),
			Shape::String => f.write_str("string"),
			Shape::Sequence(elem) => write!(f, "[{elem}]"),
			Shape::Channel(elem) => write!(f, "chan {elem}"),
			Shape::Function => f.write_str("fn"),
			Shape::Dynamic => f.write_str("any"),
			Shape::Mapping(key, elem) => write!(f, "{{{key}: {elem}}}"),
			Shape::Pointer(inner) => write!(f, "*{inner}"),
			Shape::Record(fields) => {
				f.write_str("struct {")?;
				for (idx, field) in fields.iter().enumerate() {
					if idx > 0 {
						f.write_str(",")?;
					}
					write!(f, " {}: {}", field.name, field.ty)?;
				}
				f.write_str(" }")
			}
			Shape::RawPointer => f.write_str("rawptr"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{Field, Type};

	#[test]
	fn display_renders_nested_shapes() {
		let ty = Type::mapping(Type::string(), Type::sequence(Type::pointer(Type::f32())));
		assert_eq!(ty.to_string(), "{string: [*f32]}");
	}

	#[test]
	fn named_types_are_not_identical_to_their_underlying_shape() {
		let port = Type::named("Port", Type::u16().shape().clone());
		assert!(!port.identical(&Type::u16()));
		assert!(port.same_underlying(&Type::u16()));
	}

	#[test]
	fn record_identity_includes_tags_but_underlying_check_can_skip_them() {
		let a = Type::record("A", vec![Field::new("Name", Type::string()).tag("json", "name")]);
		let b = Type::record("B", vec![Field::new("Name", Type::string())]);
		assert!(!a.same_underlying(&b));
		assert!(a.same_underlying_ignoring_tags(&b));
	}

	#[test]
	fn embedded_field_takes_type_name() {
		let inner = Type::record("Inner", Vec::new());
		let field = Field::embedded(inner);
		assert_eq!(field.name.as_ref(), "Inner");
		assert!(field.embedded);
	}
}
