//! Field codecs: how one primitive value is written to and read from a tag tree.
//!
//! A [`Codec`] is bound to a single [`ValueKind`] and carries a fallback value
//! that [`Codec::read`] returns when the key is missing. Codecs are immutable
//! once built and shared (via `Arc`) by every schema that references them.
//!
//! - [`builtin`] holds the codecs for every built-in kind.
//! - [`CodecRegistry`] maps Rust types to codecs for linker/schema derivation.
//! - [`versioned`] wraps a codec's output in a version envelope for migration.

pub mod builtin;
mod registry;
pub mod versioned;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::tag::Compound;
use crate::value::{Value, ValueKind};
use crate::version::FieldVersion;

pub use registry::{Bridge, CodecEntry, CodecRegistry, Registration};

/// A shared, type-erased codec handle.
pub type CodecRef = Arc<dyn Codec>;

/// Namespace of every built-in codec id.
pub const NAMESPACE: &str = "nbtlink";

// --- IDENTIFIER ---

/// A namespaced identifier such as `nbtlink:int`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    namespace: Cow<'static, str>,
    path: Cow<'static, str>,
}

impl Identifier {
    /// Builds an identifier from owned or borrowed parts.
    pub fn new(
        namespace: impl Into<Cow<'static, str>>,
        path: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    /// Const constructor for statically known identifiers.
    pub const fn from_static(namespace: &'static str, path: &'static str) -> Self {
        Self {
            namespace: Cow::Borrowed(namespace),
            path: Cow::Borrowed(path),
        }
    }

    /// The namespace part.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The path part.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for Identifier {
    type Err = std::convert::Infallible;

    /// Parses `namespace:path`. Without a colon the [`NAMESPACE`] is assumed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.split_once(':') {
            Some((ns, path)) => Self::new(ns.to_owned(), path.to_owned()),
            None => Self::new(NAMESPACE, s.to_owned()),
        })
    }
}

// --- CODEC ---

/// Encodes and decodes one primitive kind at a key of a tag tree.
pub trait Codec: Send + Sync + fmt::Debug {
    /// Stable identifier, recorded in versioned envelopes.
    fn id(&self) -> &Identifier;

    /// The version of the data layout this codec writes.
    fn version(&self) -> FieldVersion {
        FieldVersion::default()
    }

    /// The value kind this codec is bound to.
    fn kind(&self) -> ValueKind;

    /// The value returned by [`Codec::read`] when nothing usable is stored.
    fn fallback(&self) -> Value;

    /// Stores `value` under `key`, replacing any prior entry.
    ///
    /// A value of the wrong kind is replaced by the fallback.
    fn write(&self, key: &str, tree: &mut Compound, value: &Value);

    /// Reads the value under `key`, or the fallback if it is missing.
    fn read(&self, key: &str, tree: &Compound) -> Value;

    /// Attempts to rewrite `content` written by version `from` into the
    /// current layout. Returns whether the content is now readable.
    fn migrate(&self, content: &mut Compound, from: &FieldVersion) -> bool {
        let _ = (content, from);
        false
    }
}

// --- BUILTIN CODEC ---

/// A codec backed by a pair of plain functions.
///
/// All codecs in [`builtin`] are of this type.
#[derive(Clone)]
pub struct BuiltinCodec {
    id: Identifier,
    kind: ValueKind,
    fallback: Value,
    writer: fn(&mut Compound, &str, &Value) -> bool,
    reader: fn(&Compound, &str) -> Option<Value>,
}

impl BuiltinCodec {
    /// Builds a codec from its parts. `writer` returns `false` when it
    /// rejects the value's kind.
    pub const fn new(
        id: Identifier,
        kind: ValueKind,
        fallback: Value,
        writer: fn(&mut Compound, &str, &Value) -> bool,
        reader: fn(&Compound, &str) -> Option<Value>,
    ) -> Self {
        Self {
            id,
            kind,
            fallback,
            writer,
            reader,
        }
    }

    /// A shared handle to a copy of this codec.
    pub fn shared(&self) -> CodecRef {
        Arc::new(self.clone())
    }
}

impl fmt::Debug for BuiltinCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinCodec")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl Codec for BuiltinCodec {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn kind(&self) -> ValueKind {
        self.kind
    }

    fn fallback(&self) -> Value {
        self.fallback.clone()
    }

    fn write(&self, key: &str, tree: &mut Compound, value: &Value) {
        if !(self.writer)(tree, key, value) {
            log::warn!(
                "{} cannot write a {} value at '{key}', writing the fallback",
                self.id,
                value.kind()
            );
            (self.writer)(tree, key, &self.fallback);
        }
    }

    fn read(&self, key: &str, tree: &Compound) -> Value {
        (self.reader)(tree, key).unwrap_or_else(|| self.fallback.clone())
    }
}

// --- MAPPED CODEC ---

type Writer = Box<dyn Fn(&mut Compound, &str, &Value) -> bool + Send + Sync>;
type Reader = Box<dyn Fn(&Compound, &str) -> Option<Value> + Send + Sync>;
type Migration = Box<dyn Fn(&mut Compound, &FieldVersion) -> bool + Send + Sync>;

/// A closure-based codec for custom layouts.
///
/// ```rust
/// use nbtlink::codec::{Codec, Identifier, MappedCodec};
/// use nbtlink::tag::Compound;
/// use nbtlink::value::Value;
///
/// // An int stored as a hex string.
/// let codec = MappedCodec::new(
///     Identifier::new("demo", "hex_int"),
///     Value::Int(0),
///     |tree, key, value| match value {
///         Value::Int(v) => { tree.put_string(key, format!("{v:x}")); true }
///         _ => false,
///     },
///     |tree, key| {
///         let s = tree.get_string(key)?;
///         i32::from_str_radix(&s, 16).ok().map(Value::Int)
///     },
/// );
///
/// let mut tree = Compound::new();
/// codec.write("color", &mut tree, &Value::Int(255));
/// assert_eq!(tree.get_string("color").as_deref(), Some("ff"));
/// assert_eq!(codec.read("color", &tree), Value::Int(255));
/// ```
pub struct MappedCodec {
    id: Identifier,
    version: FieldVersion,
    fallback: Value,
    writer: Writer,
    reader: Reader,
    migration: Option<Migration>,
}

impl MappedCodec {
    /// Builds a codec; its kind is the kind of `fallback`.
    pub fn new<W, R>(id: Identifier, fallback: Value, writer: W, reader: R) -> Self
    where
        W: Fn(&mut Compound, &str, &Value) -> bool + Send + Sync + 'static,
        R: Fn(&Compound, &str) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            id,
            version: FieldVersion::default(),
            fallback,
            writer: Box::new(writer),
            reader: Box::new(reader),
            migration: None,
        }
    }

    /// Declares the layout version this codec writes.
    pub fn with_version(mut self, version: FieldVersion) -> Self {
        self.version = version;
        self
    }

    /// Installs a migration from older layouts.
    pub fn with_migration<M>(mut self, migration: M) -> Self
    where
        M: Fn(&mut Compound, &FieldVersion) -> bool + Send + Sync + 'static,
    {
        self.migration = Some(Box::new(migration));
        self
    }

    /// Wraps the codec into a shared handle.
    pub fn shared(self) -> CodecRef {
        Arc::new(self)
    }
}

impl fmt::Debug for MappedCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedCodec")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("fallback", &self.fallback)
            .field("migrates", &self.migration.is_some())
            .finish_non_exhaustive()
    }
}

impl Codec for MappedCodec {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn version(&self) -> FieldVersion {
        self.version.clone()
    }

    fn kind(&self) -> ValueKind {
        self.fallback.kind()
    }

    fn fallback(&self) -> Value {
        self.fallback.clone()
    }

    fn write(&self, key: &str, tree: &mut Compound, value: &Value) {
        if value.kind() != self.kind() || !(self.writer)(tree, key, value) {
            log::warn!(
                "{} cannot write a {} value at '{key}', writing the fallback",
                self.id,
                value.kind()
            );
            (self.writer)(tree, key, &self.fallback);
        }
    }

    fn read(&self, key: &str, tree: &Compound) -> Value {
        (self.reader)(tree, key)
            .filter(|v| v.kind() == self.kind())
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn migrate(&self, content: &mut Compound, from: &FieldVersion) -> bool {
        self.migration.as_ref().is_some_and(|m| m(content, from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_parses_with_default_namespace() {
        let id: Identifier = "int".parse().unwrap_or_else(|e| match e {});
        assert_eq!(id.to_string(), "nbtlink:int");

        let id: Identifier = "demo:hex".parse().unwrap_or_else(|e| match e {});
        assert_eq!((id.namespace(), id.path()), ("demo", "hex"));
    }

    #[test]
    fn wrong_kind_writes_fallback() {
        let codec = builtin::INT.shared();
        let mut tree = Compound::new();
        codec.write("level", &mut tree, &Value::String("five".into()));
        assert_eq!(tree.get_int("level"), Some(0));
    }
}
