//! Codecs for every built-in [`ValueKind`].
//!
//! | Codec          | Id                     | Fallback       |
//! |----------------|------------------------|----------------|
//! | [`BYTE`]       | `nbtlink:byte`         | `0`            |
//! | [`SHORT`]      | `nbtlink:short`        | `0`            |
//! | [`INT`]        | `nbtlink:int`          | `0`            |
//! | [`LONG`]       | `nbtlink:long`         | `0`            |
//! | [`FLOAT`]      | `nbtlink:float`        | `0.0`          |
//! | [`DOUBLE`]     | `nbtlink:double`       | `0.0`          |
//! | [`BOOL`]       | `nbtlink:bool`         | `false`        |
//! | [`STRING`]     | `nbtlink:string`       | `""`           |
//! | [`BYTE_ARRAY`] | `nbtlink:byte_array`   | empty          |
//! | [`INT_ARRAY`]  | `nbtlink:int_array`    | empty          |
//! | [`LONG_ARRAY`] | `nbtlink:long_array`   | empty          |
//! | [`UUID`]       | `nbtlink:uuid`         | nil UUID       |

use uuid::Uuid;

use super::{BuiltinCodec, CodecRef, Identifier, NAMESPACE};
use crate::value::{Value, ValueKind};

macro_rules! builtin_codec {
    ($(
        $(#[$doc:meta])*
        $name:ident: $path:literal, $variant:ident, $fallback:expr, $get:ident, $put:ident;
    )*) => {
        $(
            $(#[$doc])*
            pub static $name: BuiltinCodec = BuiltinCodec::new(
                Identifier::from_static(NAMESPACE, $path),
                ValueKind::$variant,
                Value::$variant($fallback),
                |tree, key, value| match value {
                    Value::$variant(v) => {
                        tree.$put(key, v.clone());
                        true
                    }
                    _ => false,
                },
                |tree, key| tree.$get(key).map(Value::$variant),
            );
        )*

        /// Shared handles to every built-in codec, paired with its kind.
        pub fn all() -> Vec<(ValueKind, CodecRef)> {
            vec![$((ValueKind::$variant, $name.shared())),*]
        }
    };
}

builtin_codec! {
    /// `i8` stored as a byte tag.
    BYTE: "byte", Byte, 0, get_byte, put_byte;
    /// `i16` stored as a short tag.
    SHORT: "short", Short, 0, get_short, put_short;
    /// `i32` stored as an int tag.
    INT: "int", Int, 0, get_int, put_int;
    /// `i64` stored as a long tag.
    LONG: "long", Long, 0, get_long, put_long;
    /// `f32` stored as a float tag.
    FLOAT: "float", Float, 0.0, get_float, put_float;
    /// `f64` stored as a double tag.
    DOUBLE: "double", Double, 0.0, get_double, put_double;
    /// `bool` stored as a `0`/`1` byte tag.
    BOOL: "bool", Bool, false, get_bool, put_bool;
    /// `String` stored as a string tag.
    STRING: "string", String, String::new(), get_string, put_string;
    /// `Vec<u8>` stored as a byte array tag.
    BYTE_ARRAY: "byte_array", ByteArray, Vec::new(), get_byte_array, put_byte_array;
    /// `Vec<i32>` stored as an int array tag.
    INT_ARRAY: "int_array", IntArray, Vec::new(), get_int_array, put_int_array;
    /// `Vec<i64>` stored as a long array tag.
    LONG_ARRAY: "long_array", LongArray, Vec::new(), get_long_array, put_long_array;
    /// `Uuid` stored as a four-int array tag.
    UUID: "uuid", Uuid, Uuid::nil(), get_uuid, put_uuid;
}

/// The built-in codec for `kind`.
pub fn for_kind(kind: ValueKind) -> &'static BuiltinCodec {
    match kind {
        ValueKind::Byte => &BYTE,
        ValueKind::Short => &SHORT,
        ValueKind::Int => &INT,
        ValueKind::Long => &LONG,
        ValueKind::Float => &FLOAT,
        ValueKind::Double => &DOUBLE,
        ValueKind::Bool => &BOOL,
        ValueKind::String => &STRING,
        ValueKind::ByteArray => &BYTE_ARRAY,
        ValueKind::IntArray => &INT_ARRAY,
        ValueKind::LongArray => &LONG_ARRAY,
        ValueKind::Uuid => &UUID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Codec;
    use crate::tag::Compound;

    #[test]
    fn missing_keys_read_fallbacks() {
        let tree = Compound::new();
        assert_eq!(INT.read("level", &tree), Value::Int(0));
        assert_eq!(STRING.read("name", &tree), Value::String(String::new()));
        assert_eq!(BOOL.read("flag", &tree), Value::Bool(false));
        assert_eq!(UUID.read("owner", &tree), Value::Uuid(Uuid::nil()));
    }

    #[test]
    fn every_kind_has_a_codec() {
        let all = all();
        assert_eq!(all.len(), 12);
        for (kind, codec) in all {
            assert_eq!(codec.kind(), kind);
            assert_eq!(codec.fallback().kind(), kind);
            assert_eq!(for_kind(kind).id(), codec.id());
        }
    }

    #[test]
    fn bool_is_a_byte_on_disk() {
        let mut tree = Compound::new();
        BOOL.write("flag", &mut tree, &Value::Bool(true));
        assert_eq!(tree.get_byte("flag"), Some(1));
        assert_eq!(BOOL.read("flag", &tree), Value::Bool(true));
    }
}
