use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use super::{builtin, CodecRef};
use crate::value::{Primitive, Value};

/// Outcome of an insert-if-absent registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The entry was added.
    Fresh,
    /// An entry already existed under that key and was kept.
    Duplicate,
}

impl Registration {
    /// Whether the registration added something.
    pub fn is_fresh(self) -> bool {
        matches!(self, Self::Fresh)
    }
}

/// Type-erased conversion between a `dyn Any` member and a [`Value`].
///
/// Built from a concrete [`Primitive`] type with [`Bridge::of`].
#[derive(Clone, Copy)]
pub struct Bridge {
    read: fn(&dyn Any) -> Option<Value>,
    write: fn(&mut dyn Any, Value) -> Result<(), Value>,
    create: fn(Value) -> Result<Box<dyn Any>, Value>,
}

impl Bridge {
    /// The bridge for `T`.
    pub fn of<T: Primitive>() -> Self {
        Self {
            read: |any| any.downcast_ref::<T>().map(T::to_value),
            write: |any, value| {
                let Some(slot) = any.downcast_mut::<T>() else {
                    return Err(value);
                };
                *slot = T::from_value(value)?;
                Ok(())
            },
            create: |value| Ok(Box::new(T::from_value(value)?) as Box<dyn Any>),
        }
    }

    /// Reads `any` as a value. `None` if it is not the bridged type.
    pub fn read(&self, any: &dyn Any) -> Option<Value> {
        (self.read)(any)
    }

    /// Overwrites `any` with `value`, handing the value back if either the
    /// target or the value has the wrong type.
    pub fn write(&self, any: &mut dyn Any, value: Value) -> Result<(), Value> {
        (self.write)(any, value)
    }

    /// Builds a fresh boxed instance of the bridged type from `value`.
    pub fn create(&self, value: Value) -> Result<Box<dyn Any>, Value> {
        (self.create)(value)
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Bridge")
    }
}

/// A codec registered for one Rust type.
#[derive(Debug, Clone)]
pub struct CodecEntry {
    /// The codec used for fields of this type.
    pub codec: CodecRef,
    /// Moves values in and out of fields of this type.
    pub bridge: Bridge,
    /// Name of the registered type.
    pub type_name: &'static str,
}

/// Maps Rust types to the codec used for fields of that type.
///
/// Linkers consult it to decide whether a member is a plain field (its type
/// has an entry) or a composite (it has none).
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    entries: HashMap<TypeId, CodecEntry>,
}

impl CodecRegistry {
    /// A registry preloaded with every built-in codec.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<i8>(builtin::BYTE.shared());
        registry.register::<i16>(builtin::SHORT.shared());
        registry.register::<i32>(builtin::INT.shared());
        registry.register::<i64>(builtin::LONG.shared());
        registry.register::<f32>(builtin::FLOAT.shared());
        registry.register::<f64>(builtin::DOUBLE.shared());
        registry.register::<bool>(builtin::BOOL.shared());
        registry.register::<String>(builtin::STRING.shared());
        registry.register::<Vec<u8>>(builtin::BYTE_ARRAY.shared());
        registry.register::<Vec<i32>>(builtin::INT_ARRAY.shared());
        registry.register::<Vec<i64>>(builtin::LONG_ARRAY.shared());
        registry.register::<uuid::Uuid>(builtin::UUID.shared());
        registry
    }

    /// A registry without any codec.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers the codec for `T` unless one is already present.
    pub fn register<T: Primitive>(&mut self, codec: CodecRef) -> Registration {
        let type_id = TypeId::of::<T>();
        if self.entries.contains_key(&type_id) {
            log::warn!(
                "codec for {} is already registered, ignoring {}",
                std::any::type_name::<T>(),
                codec.id()
            );
            return Registration::Duplicate;
        }
        if codec.kind() != T::KIND {
            log::warn!(
                "codec {} writes {} values but {} is stored as {}",
                codec.id(),
                codec.kind(),
                std::any::type_name::<T>(),
                T::KIND
            );
        }
        self.entries.insert(
            type_id,
            CodecEntry {
                codec,
                bridge: Bridge::of::<T>(),
                type_name: std::any::type_name::<T>(),
            },
        );
        Registration::Fresh
    }

    /// Whether a codec is registered for `T`.
    pub fn contains<T: 'static>(&self) -> bool {
        self.contains_id(TypeId::of::<T>())
    }

    /// Whether a codec is registered for the type with this id.
    pub fn contains_id(&self, type_id: TypeId) -> bool {
        self.entries.contains_key(&type_id)
    }

    /// The entry for the type with this id.
    pub fn lookup(&self, type_id: TypeId) -> Option<&CodecEntry> {
        self.entries.get(&type_id)
    }

    /// The codec registered for `T`.
    pub fn codec<T: 'static>(&self) -> Option<CodecRef> {
        self.lookup(TypeId::of::<T>()).map(|e| e.codec.clone())
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, MappedCodec};

    #[test]
    fn builtins_are_preloaded() {
        let registry = CodecRegistry::new();
        assert!(registry.contains::<i32>());
        assert!(registry.contains::<uuid::Uuid>());
        assert!(!registry.contains::<u32>());
        assert!(!CodecRegistry::empty().contains::<i32>());
    }

    #[test]
    fn duplicates_keep_the_first_codec() {
        let mut registry = CodecRegistry::new();
        let other = MappedCodec::new(
            "demo:int".parse().unwrap_or_else(|e| match e {}),
            Value::Int(9),
            |_, _, _| true,
            |_, _| None,
        );
        assert_eq!(registry.register::<i32>(other.shared()), Registration::Duplicate);
        assert_eq!(
            registry.codec::<i32>().map(|c| c.id().to_string()),
            Some("nbtlink:int".to_owned())
        );
    }

    #[test]
    fn bridge_refuses_foreign_types() {
        let bridge = Bridge::of::<i32>();
        let mut slot: i64 = 0;
        assert_eq!(bridge.write(&mut slot, Value::Int(3)), Err(Value::Int(3)));

        let mut slot: i32 = 0;
        assert_eq!(bridge.write(&mut slot, Value::Long(3)), Err(Value::Long(3)));
        assert_eq!(bridge.write(&mut slot, Value::Int(3)), Ok(()));
        assert_eq!(bridge.read(&slot), Some(Value::Int(3)));
    }
}
