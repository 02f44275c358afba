//! The tagged-data tree that containers persist.
//!
//! A [`Compound`] is a string-keyed map of [`Tag`]s, where a tag is either a
//! primitive payload or another compound. It is the only representation that
//! ever reaches storage; schemas and linkers translate to and from it. Both
//! types implement serde's traits, so hosts persist them with their own format.
//!
//! Booleans are stored as bytes (`0`/`1`) and UUIDs as four-element int arrays,
//! most significant int first.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- TAG ---

/// A single entry in a [`Compound`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Tag {
    /// Signed 8-bit integer (also used for booleans).
    Byte(i8),
    /// Signed 16-bit integer.
    Short(i16),
    /// Signed 32-bit integer.
    Int(i32),
    /// Signed 64-bit integer.
    Long(i64),
    /// Single precision float.
    Float(f32),
    /// Double precision float.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Raw bytes.
    ByteArray(Vec<u8>),
    /// 32-bit integer array (also used for UUIDs).
    IntArray(Vec<i32>),
    /// 64-bit integer array.
    LongArray(Vec<i64>),
    /// A nested tree.
    Compound(Compound),
}

impl Tag {
    /// Short lowercase name of the tag kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Byte(_) => "byte",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::ByteArray(_) => "byte_array",
            Self::IntArray(_) => "int_array",
            Self::LongArray(_) => "long_array",
            Self::Compound(_) => "compound",
        }
    }
}

// --- COMPOUND ---

/// A nested, string-keyed tagged-data tree.
///
/// Writes are additive and overwrite by key; stale keys are only removed by
/// [`Compound::remove`] or [`Compound::clear`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compound {
    entries: BTreeMap<String, Tag>,
}

macro_rules! scalar_accessors {
    ($($get:ident, $put:ident, $variant:ident, $t:ty);* $(;)?) => {
        $(
            #[doc = concat!("Returns the `", stringify!($variant), "` stored at `key`, if any.")]
            pub fn $get(&self, key: &str) -> Option<$t> {
                match self.entries.get(key) {
                    Some(Tag::$variant(v)) => Some(v.clone()),
                    _ => None,
                }
            }

            #[doc = concat!("Stores a `", stringify!($variant), "` at `key`, replacing any prior entry.")]
            pub fn $put(&mut self, key: &str, value: $t) {
                self.entries.insert(key.to_owned(), Tag::$variant(value));
            }
        )*
    };
}

impl Compound {
    /// Creates an empty compound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any entry exists under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether an entry of the named kind (see [`Tag::kind_name`]) exists under `key`.
    pub fn contains_kind(&self, key: &str, kind: &str) -> bool {
        self.entries.get(key).is_some_and(|tag| tag.kind_name() == kind)
    }

    /// Raw access to the tag at `key`.
    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.entries.get(key)
    }

    /// Inserts a raw tag, returning the one it replaced.
    pub fn insert(&mut self, key: impl Into<String>, tag: Tag) -> Option<Tag> {
        self.entries.insert(key.into(), tag)
    }

    /// Removes the entry under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Tag> {
        self.entries.remove(key)
    }

    scalar_accessors! {
        get_byte, put_byte, Byte, i8;
        get_short, put_short, Short, i16;
        get_int, put_int, Int, i32;
        get_long, put_long, Long, i64;
        get_float, put_float, Float, f32;
        get_double, put_double, Double, f64;
        get_string, put_string, String, String;
        get_byte_array, put_byte_array, ByteArray, Vec<u8>;
        get_int_array, put_int_array, IntArray, Vec<i32>;
        get_long_array, put_long_array, LongArray, Vec<i64>;
    }

    /// Reads a boolean stored as a byte. Any non-zero byte is `true`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_byte(key).map(|b| b != 0)
    }

    /// Stores a boolean as a byte.
    pub fn put_bool(&mut self, key: &str, value: bool) {
        self.put_byte(key, i8::from(value));
    }

    /// Reads a UUID stored as a four-element int array.
    pub fn get_uuid(&self, key: &str) -> Option<Uuid> {
        match self.entries.get(key) {
            Some(Tag::IntArray(ints)) if ints.len() == 4 => {
                let mut bytes = [0u8; 16];
                for (chunk, int) in bytes.chunks_exact_mut(4).zip(ints) {
                    chunk.copy_from_slice(&int.to_be_bytes());
                }
                Some(Uuid::from_bytes(bytes))
            }
            _ => None,
        }
    }

    /// Stores a UUID as a four-element int array.
    pub fn put_uuid(&mut self, key: &str, value: Uuid) {
        let ints = value
            .as_bytes()
            .chunks_exact(4)
            .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        self.put_int_array(key, ints);
    }

    /// Returns the nested compound at `key`, if one exists.
    pub fn get_compound(&self, key: &str) -> Option<&Compound> {
        match self.entries.get(key) {
            Some(Tag::Compound(c)) => Some(c),
            _ => None,
        }
    }

    /// Stores a nested compound at `key`.
    pub fn put_compound(&mut self, key: &str, value: Compound) {
        self.entries.insert(key.to_owned(), Tag::Compound(value));
    }

    /// Returns the nested compound at `key`, creating it when missing.
    ///
    /// A non-compound entry under the same key is replaced.
    pub fn get_or_create_compound(&mut self, key: &str) -> &mut Compound {
        let slot = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| Tag::Compound(Compound::new()));
        if !matches!(slot, Tag::Compound(_)) {
            log::debug!("replacing {} tag at '{key}' with a compound", slot.kind_name());
            *slot = Tag::Compound(Compound::new());
        }
        match slot {
            Tag::Compound(c) => c,
            _ => unreachable!("slot was just made a compound"),
        }
    }

    /// Number of direct entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the compound holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates over the keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Tag> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Compound {
    type Item = (&'a String, &'a Tag);
    type IntoIter = btree_map::Iter<'a, String, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// --- TEXT FORM ---

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(
            f: &mut fmt::Formatter<'_>,
            prefix: &str,
            items: &[T],
        ) -> fmt::Result {
            write!(f, "[{prefix};")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{item}")?;
            }
            f.write_str("]")
        }

        match self {
            Self::Byte(v) => write!(f, "{v}b"),
            Self::Short(v) => write!(f, "{v}s"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}L"),
            Self::Float(v) => write!(f, "{v}f"),
            Self::Double(v) => write!(f, "{v}d"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::ByteArray(v) => join(f, "B", v),
            Self::IntArray(v) => join(f, "I", v),
            Self::LongArray(v) => join(f, "L", v),
            Self::Compound(c) => write!(f, "{c}"),
        }
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, tag)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}:{tag}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_is_stored_as_four_ints() {
        let id = Uuid::from_u128(0x0011_2233_4455_6677_8899_aabb_ccdd_eeff);
        let mut tree = Compound::new();
        tree.put_uuid("owner", id);

        assert_eq!(
            tree.get_int_array("owner").map(|v| v.len()),
            Some(4),
        );
        assert_eq!(tree.get_uuid("owner"), Some(id));
    }

    #[test]
    fn wrong_kind_reads_as_absent() {
        let mut tree = Compound::new();
        tree.put_string("level", "five".into());

        assert!(tree.contains("level"));
        assert_eq!(tree.get_int("level"), None);
        assert!(tree.contains_kind("level", "string"));
    }

    #[test]
    fn get_or_create_replaces_scalars() {
        let mut tree = Compound::new();
        tree.put_int("position", 3);
        tree.get_or_create_compound("position").put_double("x", 1.5);

        assert_eq!(
            tree.get_compound("position").and_then(|c| c.get_double("x")),
            Some(1.5)
        );
    }

    #[test]
    fn display_is_sorted_snbt() {
        let mut tree = Compound::new();
        tree.put_int("b", 2);
        tree.put_bool("a", true);
        tree.get_or_create_compound("c").put_double("x", 0.5);

        assert_eq!(tree.to_string(), "{a:1b,b:2,c:{x:0.5d}}");
    }
}
