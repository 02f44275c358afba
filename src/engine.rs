//! The schema engine: prepare, synchronize and link pipelines over a
//! container's tag tree.
//!
//! Every schema (and every custom data category) owns the sub-tree of the
//! container tree named after its id. Access follows one protocol:
//!
//! 1. **prepare**: if the sub-tree is structurally empty, write the schema's
//!    defaults into it once; then read it into a fresh [`DataTree`].
//! 2. the caller mutates the data tree.
//! 3. **synchronize**: clear the sub-tree and write the data tree back.
//!
//! Because defaults are only written into an *empty* sub-tree, repeated
//! access never resets customized data.
//!
//! ```rust
//! use nbtlink::{Engine, Schema};
//! use nbtlink::tag::Compound;
//!
//! let engine = Engine::new();
//! let schema = Schema::builder("player_stats").int("level").build();
//! let mut root = Compound::new();
//!
//! engine.use_schema(&schema, &mut root, |data| data.put("level", 5));
//! assert_eq!(engine.prepare(&schema, &mut root).get::<i32>("level"), 5);
//! ```

use std::any::Any;

use crate::classify::{Container, DataRegistry};
use crate::codec::{CodecRef, CodecRegistry, Registration};
use crate::config::EngineConfig;
use crate::custom::CustomData;
use crate::data::DataTree;
use crate::error::{Error, Result};
use crate::events::{EventBus, Phase};
use crate::link::{LinkReport, Linked, Linker, LinkerLookup};
use crate::schema::{Schema, SchemaBuilder};
use crate::tag::Compound;
use crate::value::Primitive;

// --- PROTOCOL ---

/// Writes the defaults of `data` into an empty sub-tree, then reads it.
pub(crate) fn prime_custom(data: &mut dyn CustomData, sub_tree: &mut Compound) {
    if sub_tree.is_empty() {
        log::debug!("writing defaults of '{}'", data.category());
        data.write_to(sub_tree);
    }
    data.read_from(sub_tree);
}

// --- ENGINE ---

/// Owns the registries, configuration and listeners used by the pipelines.
///
/// Registration is expected to finish before any container is processed; the
/// engine itself does no locking.
#[derive(Debug, Default)]
pub struct Engine {
    codecs: CodecRegistry,
    linkers: LinkerLookup,
    config: EngineConfig,
    events: EventBus,
}

impl Engine {
    /// An engine with the built-in codecs and the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// An engine with the built-in codecs and `config`.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            codecs: CodecRegistry::new(),
            linkers: LinkerLookup::new(),
            config,
            events: EventBus::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The codec registry.
    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// The linker lookup.
    pub fn linkers(&self) -> &LinkerLookup {
        &self.linkers
    }

    /// The listeners called during every pipeline.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Registers the codec used for fields of type `T`.
    pub fn register_codec<T: Primitive>(&mut self, codec: CodecRef) -> Registration {
        self.codecs.register::<T>(codec)
    }

    /// Registers a hand-built linker.
    pub fn register_linker(&mut self, linker: Linker) -> Registration {
        self.linkers.register(linker)
    }

    /// Derives and registers the linker of `T` against the current codecs.
    ///
    /// Register codecs for custom field types first: a member whose type
    /// has no codec at this point is bound as a composite.
    pub fn register_linked<T: Linked>(&mut self) -> Registration {
        self.linkers.register_derived::<T>(&self.codecs)
    }

    /// A schema builder honouring [`EngineConfig::versioned_by_default`].
    pub fn schema_builder(&self, id: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(id).versioned(self.config.versioned_by_default)
    }

    /// Derives the schema of `T` from its registered linker.
    ///
    /// # Errors
    /// [`Error::MissingLinker`] if `T` has no linker.
    pub fn derive_schema<T: 'static>(&self, id: impl Into<String>) -> Result<Schema> {
        let linker = self
            .linkers
            .get::<T>()
            .ok_or(Error::MissingLinker(std::any::type_name::<T>()))?;
        Ok(linker.schema_with(id, &self.linkers, self.config.versioned_by_default))
    }

    /// A classifier registry configured like this engine.
    pub fn data_registry<C: Container + 'static>(&self) -> DataRegistry<C> {
        DataRegistry::with_config(&self.config)
    }

    // --- SCHEMA PIPELINE ---

    /// Reads the sub-tree of `schema`, writing its defaults first if the
    /// sub-tree is empty.
    pub fn prepare(&self, schema: &Schema, root: &mut Compound) -> DataTree {
        let sub_tree = root.get_or_create_compound(schema.id());
        if sub_tree.is_empty() {
            log::debug!("writing defaults of '{}'", schema.id());
            self.events.emit(Phase::PreSerialize, schema.id(), sub_tree);
            schema.write(sub_tree, &DataTree::new());
            self.events.emit(Phase::PostSerialize, schema.id(), sub_tree);
        }
        self.events.emit(Phase::PreDeserialize, schema.id(), sub_tree);
        let data = schema.read_new(sub_tree);
        self.events.emit(Phase::PostDeserialize, schema.id(), sub_tree);
        data
    }

    /// Replaces the sub-tree of `schema` with `data`.
    pub fn synchronize(&self, schema: &Schema, root: &mut Compound, data: &DataTree) {
        let sub_tree = root.get_or_create_compound(schema.id());
        sub_tree.clear();
        self.events.emit(Phase::PreSerialize, schema.id(), sub_tree);
        schema.write(sub_tree, data);
        self.events.emit(Phase::PostSerialize, schema.id(), sub_tree);
        log::trace!("synchronized '{}'", schema.id());
    }

    /// Prepares, runs `action` on the data tree, then synchronizes.
    pub fn use_schema<R>(
        &self,
        schema: &Schema,
        root: &mut Compound,
        action: impl FnOnce(&mut DataTree) -> R,
    ) -> R {
        let mut data = self.prepare(schema, root);
        let result = action(&mut data);
        self.synchronize(schema, root, &data);
        result
    }

    // --- CUSTOM DATA PIPELINE ---

    /// Loads `data` from its category's sub-tree, writing it there first if
    /// the sub-tree is empty.
    pub fn prepare_custom(&self, data: &mut dyn CustomData, root: &mut Compound) {
        let category = data.category().to_owned();
        let sub_tree = root.get_or_create_compound(&category);
        if sub_tree.is_empty() {
            self.events.emit(Phase::PreSerialize, &category, sub_tree);
            data.write_to(sub_tree);
            self.events.emit(Phase::PostSerialize, &category, sub_tree);
        }
        self.events.emit(Phase::PreDeserialize, &category, sub_tree);
        data.read_from(sub_tree);
        self.events.emit(Phase::PostDeserialize, &category, sub_tree);
    }

    /// Replaces the category's sub-tree with the state of `data`.
    pub fn synchronize_custom(&self, data: &dyn CustomData, root: &mut Compound) {
        let sub_tree = root.get_or_create_compound(data.category());
        sub_tree.clear();
        self.events.emit(Phase::PreSerialize, data.category(), sub_tree);
        data.write_to(sub_tree);
        self.events.emit(Phase::PostSerialize, data.category(), sub_tree);
    }

    /// Prepares `data`, runs `action` on it, then synchronizes.
    pub fn use_custom<D: CustomData, R>(
        &self,
        data: &mut D,
        root: &mut Compound,
        action: impl FnOnce(&mut D) -> R,
    ) -> R {
        self.prepare_custom(data, root);
        let result = action(data);
        self.synchronize_custom(data, root);
        result
    }

    // --- LINKED PIPELINE ---

    /// Prepares `schema`, links the data into `instance`, runs `action`,
    /// links `instance` back and synchronizes.
    ///
    /// The tree is synchronized even when some members failed to link.
    ///
    /// # Errors
    /// [`Error::MissingLinker`] if `T` has no linker, and [`Error::Link`]
    /// when [`EngineConfig::strict_linking`] is on and any member failed.
    pub fn use_linked<T: Any>(
        &self,
        schema: &Schema,
        instance: &mut T,
        root: &mut Compound,
        action: impl FnOnce(&mut T),
    ) -> Result<LinkReport> {
        let linker = self
            .linkers
            .get::<T>()
            .ok_or(Error::MissingLinker(std::any::type_name::<T>()))?;

        let mut data = self.prepare(schema, root);

        self.emit_for(Phase::PreForwardLink, schema, root);
        let mut report = linker.forward_link(&data, &mut *instance, &self.linkers);
        self.emit_for(Phase::PostForwardLink, schema, root);

        action(instance);

        self.emit_for(Phase::PreBackwardLink, schema, root);
        report.merge(linker.backward_link(&mut data, &mut *instance, &self.linkers));
        self.emit_for(Phase::PostBackwardLink, schema, root);

        self.synchronize(schema, root, &data);

        if self.config.strict_linking && !report.is_complete() {
            return Err(Error::Link {
                type_name: linker.type_name(),
                failures: report.failures,
            });
        }
        Ok(report)
    }

    fn emit_for(&self, phase: Phase, schema: &Schema, root: &Compound) {
        let empty = Compound::new();
        let sub_tree = root.get_compound(schema.id()).unwrap_or(&empty);
        self.events.emit(phase, schema.id(), sub_tree);
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn defaults_are_written_once() {
        let engine = Engine::new();
        let schema = Schema::builder("stats").int("level").build();
        let mut root = Compound::new();
        engine.prepare(&schema, &mut root);
        root.get_or_create_compound("stats").put_int("level", 8);
        assert_eq!(engine.prepare(&schema, &mut root).get::<i32>("level"), 8);
    }

    #[test]
    fn prepare_reports_every_phase() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut engine = Engine::new();
        let counter = Arc::clone(&seen);
        engine.events_mut().subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let schema = Schema::builder("stats").int("level").build();
        let mut root = Compound::new();
        engine.prepare(&schema, &mut root);
        // Pre/post serialize for the defaults, pre/post deserialize for the read.
        assert_eq!(seen.load(Ordering::SeqCst), 4);

        engine.prepare(&schema, &mut root);
        assert_eq!(seen.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn use_linked_needs_a_linker() {
        let engine = Engine::new();
        let schema = Schema::new("stats");
        let mut value = 0_u8;
        let result = engine.use_linked(&schema, &mut value, &mut Compound::new(), |_| {});
        assert!(matches!(result, Err(Error::MissingLinker(_))));
    }
}
