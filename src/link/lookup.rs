use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use super::{Linked, Linker};
use crate::codec::{CodecRegistry, Registration};

/// The linkers known to an engine, keyed by bound type.
///
/// Composite bindings resolve their nested type's linker here at link time,
/// so every composite type must be registered before linking.
#[derive(Debug, Clone, Default)]
pub struct LinkerLookup {
    linkers: HashMap<TypeId, Arc<Linker>>,
}

impl LinkerLookup {
    /// An empty lookup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a linker unless its type already has one.
    pub fn register(&mut self, linker: Linker) -> Registration {
        if self.linkers.contains_key(&linker.type_id()) {
            log::warn!("linker for {} is already registered", linker.type_name());
            return Registration::Duplicate;
        }
        self.linkers.insert(linker.type_id(), Arc::new(linker));
        Registration::Fresh
    }

    /// Derives and registers the linker of `T`.
    pub fn register_derived<T: Linked>(&mut self, codecs: &CodecRegistry) -> Registration {
        if self.contains::<T>() {
            log::warn!("linker for {} is already registered", std::any::type_name::<T>());
            return Registration::Duplicate;
        }
        self.register(Linker::derive::<T>(codecs))
    }

    /// Whether `T` has a linker.
    pub fn contains<T: 'static>(&self) -> bool {
        self.linkers.contains_key(&TypeId::of::<T>())
    }

    /// The linker of `T`.
    pub fn get<T: 'static>(&self) -> Option<&Linker> {
        self.get_by_id(TypeId::of::<T>())
    }

    /// The linker of the type with this id.
    pub fn get_by_id(&self, type_id: TypeId) -> Option<&Linker> {
        self.linkers.get(&type_id).map(Arc::as_ref)
    }

    /// A shared handle to the linker of `T`.
    pub fn shared<T: 'static>(&self) -> Option<Arc<Linker>> {
        self.linkers.get(&TypeId::of::<T>()).cloned()
    }

    /// Number of registered linkers.
    pub fn len(&self) -> usize {
        self.linkers.len()
    }

    /// Whether no linker is registered.
    pub fn is_empty(&self) -> bool {
        self.linkers.is_empty()
    }
}
