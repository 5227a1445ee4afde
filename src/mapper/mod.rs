mod aggregate;
mod class;
mod compat;
mod engine;
mod error;
mod field;
mod json;
mod load;
mod normalize;
mod path;
mod trace;
mod ty;
mod value;

/// Error accumulator for independent calls.
pub use aggregate::AggregatedError;
/// Coarse type classification.
pub use class::TypeClass;
/// Assignability and conversion oracle.
pub use compat::{Compatibility, Converter, assignable, compatibility, convert, converter, convertible};
/// Assignment engine, destination handles, and default entry points.
pub use engine::{Mapper, Slot, map, map_value};
/// Error and result aliases.
pub use error::{MapError, Result};
/// Field annotation parsing.
pub use field::{DEFAULT_FIELD_TAG, FieldInfo, parse_field};
/// Content decoders and loader.
pub use load::{AutoDecoder, Decoder, JsonDecoder, Loader, YamlDecoder};
/// Mapping key normalization.
pub use normalize::stringify_keys;
/// Assignment path used in errors and traces.
pub use path::Path;
/// Assignment trace hooks.
pub use trace::{TraceEvent, TraceHook, TraceLog};
/// Type descriptors.
pub use ty::{Field, FloatWidth, IntWidth, Shape, Type, TypeRef};
/// Runtime values.
pub use value::{ChannelRef, Data, FunctionRef, MapRef, Mapping, Pointer, Value};
