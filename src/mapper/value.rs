use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::mapper::{FloatWidth, IntWidth, Shape, Type, TypeClass, TypeRef};

/// Shared mapping storage.
pub type MapRef = Rc<RefCell<Mapping>>;

/// Shared pointer target.
pub type Pointer = Rc<RefCell<Value>>;

/// Shared channel buffer.
pub type ChannelRef = Rc<RefCell<VecDeque<Value>>>;

/// Shared opaque callable.
#[derive(Clone)]
pub struct FunctionRef(Rc<dyn Fn(&[Value]) -> Vec<Value>>);

impl FunctionRef {
	/// Wrap a closure.
	pub fn new(f: impl Fn(&[Value]) -> Vec<Value> + 'static) -> Self {
		Self(Rc::new(f))
	}

	/// Invoke the callable.
	pub fn call(&self, args: &[Value]) -> Vec<Value> {
		(self.0)(args)
	}

	/// Whether both handles share one callable.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for FunctionRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "FunctionRef({:p})", Rc::as_ptr(&self.0))
	}
}

/// Runtime payload of a [`Value`], mirroring [`Shape`].
#[derive(Debug, Clone)]
pub enum Data {
	/// Absent value.
	Invalid,
	/// Boolean payload.
	Bool(bool),
	/// Signed payload, wrapped to the declared width.
	Int(i64),
	/// Unsigned payload, wrapped to the declared width.
	Uint(u64),
	/// Float payload, rounded to the declared width.
	Float(f64),
	/// Complex payload `(re, im)`.
	Complex(f64, f64),
	/// Text payload.
	String(String),
	/// Sequence elements.
	Sequence(Vec<Value>),
	/// Channel handle, `None` when nil.
	Channel(Option<ChannelRef>),
	/// Callable handle, `None` when nil.
	Function(Option<FunctionRef>),
	/// Held concrete value, `None` when nil.
	Dynamic(Option<Box<Value>>),
	/// Mapping storage, `None` when nil.
	Mapping(Option<MapRef>),
	/// Pointer target, `None` when nil.
	Pointer(Option<Pointer>),
	/// Field values in declaration order.
	Record(Vec<Value>),
	/// Untyped address.
	RawPointer(usize),
}

/// Insertion-ordered key/value storage.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
	entries: Vec<(Value, Value)>,
}

impl Mapping {
	/// Empty mapping.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the mapping has no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Look up a value by key.
	pub fn get(&self, key: &Value) -> Option<&Value> {
		self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
	}

	/// Look up a value by key for in-place mutation.
	pub fn get_mut(&mut self, key: &Value) -> Option<&mut Value> {
		self.entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
	}

	/// Look up a value by textual key.
	pub fn get_str(&self, key: &str) -> Option<&Value> {
		self.entries.iter().find(|(k, _)| k.as_str() == Some(key)).map(|(_, v)| v)
	}

	/// Insert or replace the value stored under `key`.
	pub fn insert(&mut self, key: Value, value: Value) {
		match self.get_mut(&key) {
			Some(slot) => *slot = value,
			None => self.entries.push((key, value)),
		}
	}

	/// Iterate entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
		self.entries.iter().map(|(k, v)| (k, v))
	}

	/// Iterate keys in insertion order.
	pub fn keys(&self) -> impl Iterator<Item = &Value> {
		self.entries.iter().map(|(k, _)| k)
	}

	fn detach(&self) -> Self {
		Self {
			entries: self.entries.iter().map(|(k, v)| (k.clone(), v.detach())).collect(),
		}
	}
}

impl PartialEq for Mapping {
	fn eq(&self, other: &Self) -> bool {
		self.len() == other.len() && self.iter().all(|(k, v)| other.get(k).is_some_and(|item| item == v))
	}
}

impl FromIterator<(Value, Value)> for Mapping {
	fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
		let mut out = Self::new();
		for (k, v) in iter {
			out.insert(k, v);
		}
		out
	}
}

/// Typed runtime value.
#[derive(Debug, Clone)]
pub struct Value {
	ty: TypeRef,
	data: Data,
}

impl Value {
	/// Pair a type with a payload; the payload must match the type's shape.
	pub fn new(ty: TypeRef, data: Data) -> Self {
		Self { ty, data }
	}

	/// Structurally absent value.
	pub fn invalid() -> Self {
		Self::new(Type::invalid(), Data::Invalid)
	}

	/// Zero value of `ty`.
	pub fn zero(ty: &TypeRef) -> Self {
		let data = match ty.shape() {
			Shape::Invalid => Data::Invalid,
			Shape::Bool => Data::Bool(false),
			Shape::Int(_) => Data::Int(0),
			Shape::Uint(_) => Data::Uint(0),
			Shape::Float(_) => Data::Float(0.0),
			Shape::Complex(_) => Data::Complex(0.0, 0.0),
			Shape::String => Data::String(String::new()),
			Shape::Sequence(_) => Data::Sequence(Vec::new()),
			Shape::Channel(_) => Data::Channel(None),
			Shape::Function => Data::Function(None),
			Shape::Dynamic => Data::Dynamic(None),
			Shape::Mapping(..) => Data::Mapping(None),
			Shape::Pointer(_) => Data::Pointer(None),
			Shape::Record(fields) => Data::Record(fields.iter().map(|field| Self::zero(&field.ty)).collect()),
			Shape::RawPointer => Data::RawPointer(0),
		};
		Self::new(ty.clone(), data)
	}

	/// `bool` value.
	pub fn bool(value: bool) -> Self {
		Self::new(Type::bool(), Data::Bool(value))
	}

	/// `i64` value.
	pub fn i64(value: i64) -> Self {
		Self::new(Type::i64(), Data::Int(value))
	}

	/// `u64` value.
	pub fn u64(value: u64) -> Self {
		Self::new(Type::u64(), Data::Uint(value))
	}

	/// `f64` value.
	pub fn f64(value: f64) -> Self {
		Self::new(Type::f64(), Data::Float(value))
	}

	/// `f32` value.
	pub fn f32(value: f32) -> Self {
		Self::new(Type::f32(), Data::Float(f64::from(value)))
	}

	/// `complex128` value.
	pub fn complex128(re: f64, im: f64) -> Self {
		Self::new(Type::complex128(), Data::Complex(re, im))
	}

	/// `string` value.
	pub fn string(value: impl Into<String>) -> Self {
		Self::new(Type::string(), Data::String(value.into()))
	}

	/// Integer of a specific declared type, wrapped to its width.
	pub fn int_of(ty: &TypeRef, value: i64) -> Self {
		let data = match ty.shape() {
			Shape::Int(width) => Data::Int(wrap_signed(value, *width)),
			Shape::Uint(width) => Data::Uint(wrap_unsigned(value as u64, *width)),
			Shape::Float(width) => Data::Float(round_float(value as f64, *width)),
			_ => Data::Int(value),
		};
		Self::new(ty.clone(), data)
	}

	/// `any` slot holding `value`; values already typed `any` are returned as-is.
	pub fn any(value: Value) -> Self {
		if value.class() == TypeClass::Dynamic {
			return value;
		}
		Self::new(Type::dynamic(), Data::Dynamic(Some(Box::new(value))))
	}

	/// Nil `any` slot.
	pub fn any_nil() -> Self {
		Self::new(Type::dynamic(), Data::Dynamic(None))
	}

	/// Sequence of `elem` built from `items`.
	pub fn sequence(elem: TypeRef, items: Vec<Value>) -> Self {
		Self::new(Type::sequence(elem), Data::Sequence(items))
	}

	/// Allocated mapping of type `ty` built from `entries`.
	pub fn mapping(ty: TypeRef, entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
		let map: Mapping = entries.into_iter().collect();
		Self::new(ty, Data::Mapping(Some(Rc::new(RefCell::new(map)))))
	}

	/// Document mapping `{string: any}` with each value wrapped in an `any` slot.
	pub fn document<'a>(entries: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
		Self::mapping(
			Type::document(),
			entries.into_iter().map(|(k, v)| (Self::string(k), Self::any(v))),
		)
	}

	/// Record of type `ty` built from field values in declaration order.
	pub fn record(ty: TypeRef, fields: Vec<Value>) -> Self {
		Self::new(ty, Data::Record(fields))
	}

	/// Pointer to a freshly allocated target holding `value`.
	pub fn pointer_to(value: Value) -> Self {
		let ty = Type::pointer(value.ty.clone());
		Self::new(ty, Data::Pointer(Some(Rc::new(RefCell::new(value)))))
	}

	/// Pointer of type `ty` sharing an existing target.
	pub fn pointer_from(ty: TypeRef, target: Pointer) -> Self {
		Self::new(ty, Data::Pointer(Some(target)))
	}

	/// Nil pointer to `pointee`.
	pub fn nil_pointer(pointee: TypeRef) -> Self {
		Self::new(Type::pointer(pointee), Data::Pointer(None))
	}

	/// Empty channel carrying `elem`.
	pub fn channel(elem: TypeRef) -> Self {
		Self::new(Type::channel(elem), Data::Channel(Some(Rc::new(RefCell::new(VecDeque::new())))))
	}

	/// Callable value.
	pub fn function(f: impl Fn(&[Value]) -> Vec<Value> + 'static) -> Self {
		Self::new(Type::function(), Data::Function(Some(FunctionRef::new(f))))
	}

	/// Declared or runtime type.
	pub fn ty(&self) -> &TypeRef {
		&self.ty
	}

	/// Runtime payload.
	pub fn data(&self) -> &Data {
		&self.data
	}

	pub(crate) fn data_mut(&mut self) -> &mut Data {
		&mut self.data
	}

	/// Class of the value's type.
	pub fn class(&self) -> TypeClass {
		TypeClass::of(&self.ty)
	}

	/// Whether the value is present.
	pub fn is_valid(&self) -> bool {
		!matches!(self.data, Data::Invalid)
	}

	/// Whether the value is a nil mapping, pointer, dynamic slot, channel, or function.
	pub fn is_nil(&self) -> bool {
		matches!(
			self.data,
			Data::Mapping(None) | Data::Pointer(None) | Data::Dynamic(None) | Data::Channel(None) | Data::Function(None)
		)
	}

	/// Reinterpret the payload under another type with the same shape.
	pub(crate) fn retyped(self, ty: &TypeRef) -> Self {
		Self { ty: ty.clone(), data: self.data }
	}

	/// Follow `any` layers to the held concrete value; `None` when a layer is nil.
	pub fn concrete(&self) -> Option<&Value> {
		let mut current = self;
		loop {
			match &current.data {
				Data::Dynamic(Some(inner)) => current = inner,
				Data::Dynamic(None) => return None,
				_ => return Some(current),
			}
		}
	}

	/// Consume `any` layers, yielding the held concrete value or an absent value.
	pub(crate) fn into_concrete(self) -> Value {
		match self.data {
			Data::Dynamic(Some(inner)) => inner.into_concrete(),
			Data::Dynamic(None) => Value::invalid(),
			_ => self,
		}
	}

	/// Boolean payload.
	pub fn as_bool(&self) -> Option<bool> {
		match self.concrete()?.data {
			Data::Bool(value) => Some(value),
			_ => None,
		}
	}

	/// Signed payload.
	pub fn as_i64(&self) -> Option<i64> {
		match self.concrete()?.data {
			Data::Int(value) => Some(value),
			_ => None,
		}
	}

	/// Unsigned payload.
	pub fn as_u64(&self) -> Option<u64> {
		match self.concrete()?.data {
			Data::Uint(value) => Some(value),
			_ => None,
		}
	}

	/// Float payload.
	pub fn as_f64(&self) -> Option<f64> {
		match self.concrete()?.data {
			Data::Float(value) => Some(value),
			_ => None,
		}
	}

	/// Complex payload.
	pub fn as_complex(&self) -> Option<(f64, f64)> {
		match self.concrete()?.data {
			Data::Complex(re, im) => Some((re, im)),
			_ => None,
		}
	}

	/// Text payload.
	pub fn as_str(&self) -> Option<&str> {
		match &self.concrete()?.data {
			Data::String(value) => Some(value),
			_ => None,
		}
	}

	/// Sequence elements.
	pub fn items(&self) -> Option<&[Value]> {
		match &self.concrete()?.data {
			Data::Sequence(items) => Some(items),
			_ => None,
		}
	}

	/// Mapping storage, `None` for nil or non-mapping values.
	pub fn map_ref(&self) -> Option<&MapRef> {
		match &self.concrete()?.data {
			Data::Mapping(map) => map.as_ref(),
			_ => None,
		}
	}

	/// Clone of the entry stored under a textual key.
	pub fn get(&self, key: &str) -> Option<Value> {
		self.map_ref().and_then(|map| map.borrow().get_str(key).cloned())
	}

	/// Number of entries, elements, or bytes.
	pub fn len(&self) -> usize {
		let Some(value) = self.concrete() else {
			return 0;
		};
		match &value.data {
			Data::String(value) => value.len(),
			Data::Sequence(items) => items.len(),
			Data::Mapping(Some(map)) => map.borrow().len(),
			_ => 0,
		}
	}

	/// Record field by declared name.
	pub fn field(&self, name: &str) -> Option<&Value> {
		let index = self.ty.fields().iter().position(|field| field.name.as_ref() == name)?;
		match &self.data {
			Data::Record(fields) => fields.get(index),
			_ => None,
		}
	}

	/// Record field by declared name, for mutation.
	pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
		let index = self.ty.fields().iter().position(|field| field.name.as_ref() == name)?;
		match &mut self.data {
			Data::Record(fields) => fields.get_mut(index),
			_ => None,
		}
	}

	/// Pointer target handle.
	pub fn target(&self) -> Option<&Pointer> {
		match &self.concrete()?.data {
			Data::Pointer(target) => target.as_ref(),
			_ => None,
		}
	}

	/// Clone of the pointer target.
	pub fn deref(&self) -> Option<Value> {
		self.target().map(|target| target.borrow().clone())
	}

	/// Whether both values are pointers sharing one target.
	pub fn same_target(&self, other: &Value) -> bool {
		match (self.target(), other.target()) {
			(Some(a), Some(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}

	/// Omit-empty predicate: zero numbers, zero-length text/sequences/mappings,
	/// and nil layers count as empty; everything else never does.
	pub fn is_empty(&self) -> bool {
		match &self.data {
			Data::Invalid => true,
			Data::Int(value) => *value == 0,
			Data::Uint(value) => *value == 0,
			Data::Float(value) => *value == 0.0,
			Data::Complex(re, im) => *re == 0.0 && *im == 0.0,
			Data::String(value) => value.is_empty(),
			Data::Sequence(items) => items.is_empty(),
			Data::Mapping(None) => true,
			Data::Mapping(Some(map)) => map.try_borrow().map(|map| map.is_empty()).unwrap_or(false),
			Data::Dynamic(None) | Data::Pointer(None) => true,
			Data::Dynamic(Some(inner)) => inner.is_empty(),
			Data::Pointer(Some(target)) => target.try_borrow().map(|inner| inner.is_empty()).unwrap_or(false),
			_ => false,
		}
	}

	/// Copy with fresh mapping storage; pointer targets stay shared.
	pub fn detach(&self) -> Value {
		let data = match &self.data {
			Data::Sequence(items) => Data::Sequence(items.iter().map(Value::detach).collect()),
			Data::Record(fields) => Data::Record(fields.iter().map(Value::detach).collect()),
			Data::Dynamic(Some(inner)) => Data::Dynamic(Some(Box::new(inner.detach()))),
			Data::Mapping(Some(map)) => match map.try_borrow() {
				Ok(map) => Data::Mapping(Some(Rc::new(RefCell::new(map.detach())))),
				Err(_) => Data::Mapping(Some(map.clone())),
			},
			other => other.clone(),
		};
		Self::new(self.ty.clone(), data)
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		self.ty.identical(&other.ty) && self.data == other.data
	}
}

impl PartialEq for Data {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Invalid, Self::Invalid) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Uint(a), Self::Uint(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => a == b,
			(Self::Complex(ar, ai), Self::Complex(br, bi)) => ar == br && ai == bi,
			(Self::String(a), Self::String(b)) => a == b,
			(Self::Sequence(a), Self::Sequence(b)) | (Self::Record(a), Self::Record(b)) => a == b,
			(Self::Channel(a), Self::Channel(b)) => match (a, b) {
				(Some(a), Some(b)) => Rc::ptr_eq(a, b),
				(None, None) => true,
				_ => false,
			},
			(Self::Function(a), Self::Function(b)) => match (a, b) {
				(Some(a), Some(b)) => a.ptr_eq(b),
				(None, None) => true,
				_ => false,
			},
			(Self::Dynamic(a), Self::Dynamic(b)) => a == b,
			(Self::Mapping(a), Self::Mapping(b)) => match (a, b) {
				(Some(a), Some(b)) => {
					Rc::ptr_eq(a, b)
						|| match (a.try_borrow(), b.try_borrow()) {
							(Ok(a), Ok(b)) => *a == *b,
							_ => false,
						}
				}
				(None, None) => true,
				_ => false,
			},
			(Self::Pointer(a), Self::Pointer(b)) => match (a, b) {
				(Some(a), Some(b)) => Rc::ptr_eq(a, b),
				(None, None) => true,
				_ => false,
			},
			(Self::RawPointer(a), Self::RawPointer(b)) => a == b,
			_ => false,
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let Some(value) = self.concrete() else {
			return f.write_str("<nil>");
		};
		match &value.data {
			Data::Invalid => f.write_str("<invalid>"),
			Data::Bool(value) => write!(f, "{value}"),
			Data::Int(value) => write!(f, "{value}"),
			Data::Uint(value) => write!(f, "{value}"),
			Data::Float(value) => write!(f, "{value}"),
			Data::Complex(re, im) => write!(f, "({re}+{im}i)"),
			Data::String(value) => f.write_str(value),
			_ => write!(f, "<{}>", value.ty),
		}
	}
}

/// Wrap a signed payload to `width` bits.
pub(crate) fn wrap_signed(value: i64, width: IntWidth) -> i64 {
	match width {
		IntWidth::W8 => i64::from(value as i8),
		IntWidth::W16 => i64::from(value as i16),
		IntWidth::W32 => i64::from(value as i32),
		IntWidth::W64 => value,
	}
}

/// Wrap an unsigned payload to `width` bits.
pub(crate) fn wrap_unsigned(value: u64, width: IntWidth) -> u64 {
	match width {
		IntWidth::W8 => u64::from(value as u8),
		IntWidth::W16 => u64::from(value as u16),
		IntWidth::W32 => u64::from(value as u32),
		IntWidth::W64 => value,
	}
}

/// Round a float payload to `width` precision.
pub(crate) fn round_float(value: f64, width: FloatWidth) -> f64 {
	match width {
		FloatWidth::W32 => f64::from(value as f32),
		FloatWidth::W64 => value,
	}
}
