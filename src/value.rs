//! Typed values held by a [`DataTree`](crate::DataTree).
//!
//! Values form a closed set of primitive kinds. Every Rust type that can sit
//! in a plain (non-composite) field implements [`Primitive`], which converts
//! it to and from a [`Value`] of exactly one [`ValueKind`].

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// `i8`
    Byte,
    /// `i16`
    Short,
    /// `i32`
    Int,
    /// `i64`
    Long,
    /// `f32`
    Float,
    /// `f64`
    Double,
    /// `bool`
    Bool,
    /// `String`
    String,
    /// `Vec<u8>`
    ByteArray,
    /// `Vec<i32>`
    IntArray,
    /// `Vec<i64>`
    LongArray,
    /// `uuid::Uuid`
    Uuid,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::String => "string",
            Self::ByteArray => "byte_array",
            Self::IntArray => "int_array",
            Self::LongArray => "long_array",
            Self::Uuid => "uuid",
        };
        f.write_str(name)
    }
}

/// A single typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// See [`ValueKind::Byte`].
    Byte(i8),
    /// See [`ValueKind::Short`].
    Short(i16),
    /// See [`ValueKind::Int`].
    Int(i32),
    /// See [`ValueKind::Long`].
    Long(i64),
    /// See [`ValueKind::Float`].
    Float(f32),
    /// See [`ValueKind::Double`].
    Double(f64),
    /// See [`ValueKind::Bool`].
    Bool(bool),
    /// See [`ValueKind::String`].
    String(String),
    /// See [`ValueKind::ByteArray`].
    ByteArray(Vec<u8>),
    /// See [`ValueKind::IntArray`].
    IntArray(Vec<i32>),
    /// See [`ValueKind::LongArray`].
    LongArray(Vec<i64>),
    /// See [`ValueKind::Uuid`].
    Uuid(Uuid),
}

impl Value {
    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Byte(_) => ValueKind::Byte,
            Self::Short(_) => ValueKind::Short,
            Self::Int(_) => ValueKind::Int,
            Self::Long(_) => ValueKind::Long,
            Self::Float(_) => ValueKind::Float,
            Self::Double(_) => ValueKind::Double,
            Self::Bool(_) => ValueKind::Bool,
            Self::String(_) => ValueKind::String,
            Self::ByteArray(_) => ValueKind::ByteArray,
            Self::IntArray(_) => ValueKind::IntArray,
            Self::LongArray(_) => ValueKind::LongArray,
            Self::Uuid(_) => ValueKind::Uuid,
        }
    }
}

/// A Rust type that maps onto one [`ValueKind`].
///
/// Implemented for the built-in kinds. Custom types may implement it to
/// reuse an existing kind, then register a codec for themselves in the
/// [`CodecRegistry`](crate::codec::CodecRegistry):
///
/// ```rust
/// use nbtlink::value::{Primitive, Value, ValueKind};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Rgb(i32);
///
/// impl Primitive for Rgb {
///     const KIND: ValueKind = ValueKind::Int;
///
///     fn to_value(&self) -> Value {
///         Value::Int(self.0)
///     }
///
///     fn from_value(value: Value) -> Result<Self, Value> {
///         match value {
///             Value::Int(v) => Ok(Rgb(v)),
///             other => Err(other),
///         }
///     }
/// }
///
/// assert_eq!(Rgb::from_value(Value::Int(7)), Ok(Rgb(7)));
/// ```
pub trait Primitive: Clone + Sized + 'static {
    /// The kind this type is stored as.
    const KIND: ValueKind;

    /// Converts a borrowed instance into a value.
    fn to_value(&self) -> Value;

    /// Converts a value back, handing it back unchanged on kind mismatch.
    fn from_value(value: Value) -> Result<Self, Value>;
}

macro_rules! impl_primitive {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Primitive for $t {
                const KIND: ValueKind = ValueKind::$variant;

                fn to_value(&self) -> Value {
                    Value::$variant(self.clone())
                }

                fn from_value(value: Value) -> Result<Self, Value> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(other),
                    }
                }
            }

            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_primitive!(
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    bool => Bool,
    String => String,
    Vec<u8> => ByteArray,
    Vec<i32> => IntArray,
    Vec<i64> => LongArray,
    Uuid => Uuid,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_hands_value_back() {
        let back = i32::from_value(Value::Double(1.0));
        assert_eq!(back, Err(Value::Double(1.0)));
    }

    #[test]
    fn kinds_line_up() {
        assert_eq!(Value::from(3i64).kind(), i64::KIND);
        assert_eq!(Value::from("a").kind(), ValueKind::String);
        assert_eq!(Uuid::nil().to_value().kind(), ValueKind::Uuid);
    }
}
