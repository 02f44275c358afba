//! Object linking: moving values between a [`DataTree`] and a Rust object.
//!
//! A [`Linker`] binds tree keys to members of one host type. Plain bindings
//! copy a primitive value through its codec's [`Bridge`]; composite bindings
//! recurse into a nested object with the nested type's own linker, looked up
//! in a [`LinkerLookup`] at link time.
//!
//! Linkers are built either from a derived [`Layout`] ([`Linker::derive`]) or
//! by hand with a [`LinkerBuilder`].
//!
//! Linking is best-effort. A member that cannot be transferred is logged,
//! recorded in the returned [`LinkReport`] and skipped; its siblings are still
//! linked.

mod builder;
mod layout;
mod lookup;

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::codec::{Bridge, CodecRef, CodecRegistry};
use crate::data::DataTree;
use crate::schema::Schema;
use crate::value::{Value, ValueKind};

pub use builder::LinkerBuilder;
pub use layout::{Filler, Getter, GetterMut, Layout, LinkMode, Linked, Member, Role};
pub use lookup::LinkerLookup;

// --- ERRORS & REPORTS ---

/// Why a single member could not be transferred.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccessError {
    /// The instance is not of the type the linker is bound to.
    #[error("instance is not a {expected}")]
    WrongInstance {
        /// The bound type.
        expected: &'static str,
    },
    /// The value in the data tree has another kind than the member.
    #[error("expected a {expected} value, found {found}")]
    KindMismatch {
        /// Kind of the member.
        expected: ValueKind,
        /// Kind found in the data tree.
        found: ValueKind,
    },
    /// Nothing to transfer: the key is missing from the data tree, or an
    /// optional plain member is empty.
    #[error("no value present")]
    Absent,
    /// No linker is registered for the composite member's type.
    #[error("no linker registered for {0}")]
    MissingLinker(&'static str),
    /// An absent composite could not be constructed.
    #[error("could not construct a {0}")]
    Construct(&'static str),
}

/// A member that failed to link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkFailure {
    /// The host type.
    pub type_name: &'static str,
    /// The tree key of the member.
    pub key: String,
    /// What went wrong.
    pub error: AccessError,
}

impl fmt::Display for LinkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.type_name, self.key, self.error)
    }
}

/// Outcome of a forward or backward link, including nested objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkReport {
    /// Number of plain values transferred.
    pub linked: usize,
    /// Every member that was skipped.
    pub failures: Vec<LinkFailure>,
}

impl LinkReport {
    /// Whether every bound member was transferred.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: LinkReport) {
        self.linked += other.linked;
        self.failures.extend(other.failures);
    }

    fn fail(&mut self, type_name: &'static str, key: &str, error: AccessError) {
        log::error!("cannot link {type_name}.{key}: {error}");
        self.failures.push(LinkFailure {
            type_name,
            key: key.to_owned(),
            error,
        });
    }
}

// --- BINDINGS ---

type Factory = Arc<dyn Fn() -> Box<dyn Any> + Send + Sync>;
type ValueGetter = Arc<dyn Fn(&dyn Any) -> Result<Value, AccessError> + Send + Sync>;
type ValueSetter = Arc<dyn Fn(&mut dyn Any, Value) -> Result<(), AccessError> + Send + Sync>;
type Resolver = Arc<
    dyn Fn(&mut dyn Any, &Linker, &mut dyn FnMut(&mut dyn Any)) -> Result<(), AccessError>
        + Send
        + Sync,
>;

/// A plain member bound to a key.
#[derive(Clone)]
pub struct FieldBinding {
    codec: CodecRef,
    get: ValueGetter,
    set: ValueSetter,
}

impl FieldBinding {
    /// The codec that persists this field.
    pub fn codec(&self) -> &CodecRef {
        &self.codec
    }
}

/// A nested object bound to a key.
#[derive(Clone)]
pub struct CompositeBinding {
    target: TypeId,
    target_name: &'static str,
    resolve: Resolver,
}

impl CompositeBinding {
    /// Id of the nested object's type.
    pub fn target(&self) -> TypeId {
        self.target
    }

    /// Name of the nested object's type.
    pub fn target_name(&self) -> &'static str {
        self.target_name
    }
}

fn field_binding<G, S>(codec: CodecRef, get: G, set: S) -> FieldBinding
where
    G: Fn(&dyn Any) -> Result<Value, AccessError> + Send + Sync + 'static,
    S: Fn(&mut dyn Any, Value) -> Result<(), AccessError> + Send + Sync + 'static,
{
    FieldBinding {
        codec,
        get: Arc::new(get),
        set: Arc::new(set),
    }
}

fn composite_binding<R>(target: TypeId, target_name: &'static str, resolve: R) -> CompositeBinding
where
    R: Fn(&mut dyn Any, &Linker, &mut dyn FnMut(&mut dyn Any)) -> Result<(), AccessError>
        + Send
        + Sync
        + 'static,
{
    CompositeBinding {
        target,
        target_name,
        resolve: Arc::new(resolve),
    }
}

/// One hop from a host to an embedded base.
#[derive(Clone, Copy)]
struct Step {
    get: Getter,
    get_mut: GetterMut,
}

fn walk<'a>(steps: &[Step], mut any: &'a dyn Any) -> Option<&'a dyn Any> {
    for step in steps {
        any = (step.get)(any)?;
    }
    Some(any)
}

fn walk_mut<'a>(steps: &[Step], mut any: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
    for step in steps {
        any = (step.get_mut)(any)?;
    }
    Some(any)
}

// --- LINKER ---

/// Bidirectional binding between a [`DataTree`] and one host type.
#[derive(Clone)]
pub struct Linker {
    type_id: TypeId,
    type_name: &'static str,
    factory: Factory,
    fields: BTreeMap<String, FieldBinding>,
    composites: BTreeMap<String, CompositeBinding>,
}

impl fmt::Debug for Linker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Linker")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("composites", &self.composites.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Linker {
    pub(crate) fn empty<T: Any>(factory: Factory) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            factory,
            fields: BTreeMap::new(),
            composites: BTreeMap::new(),
        }
    }

    /// Starts a hand-written linker for `T`, built with `T::default()`.
    pub fn builder<T: Any + Default>() -> LinkerBuilder<T> {
        LinkerBuilder::new(T::default)
    }

    /// Builds the linker of `T` from its derived layout.
    ///
    /// In automatic mode a member whose type has a codec in `codecs` becomes
    /// a plain field; any other member becomes a composite. Base members are
    /// flattened when the layout opts into inheritance.
    pub fn derive<T: Linked>(codecs: &CodecRegistry) -> Self {
        let factory: Factory = Arc::new(|| Box::new(T::create()) as Box<dyn Any>);
        let mut linker = Self::empty::<T>(factory);
        linker.bind_layout(&T::layout(), &[], codecs);
        linker
    }

    fn bind_layout(&mut self, layout: &Layout, path: &[Step], codecs: &CodecRegistry) {
        for member in layout.members.iter().filter(|m| layout.selects(m)) {
            match member.role {
                Role::Base => match member.layout {
                    Some(base) => {
                        let mut base_path = path.to_vec();
                        base_path.push(Step {
                            get: member.get,
                            get_mut: member.get_mut,
                        });
                        self.bind_layout(&base(), &base_path, codecs);
                    }
                    None => {
                        let (host, name) = (layout.type_name, member.name);
                        log::error!("base member {host}.{name} has no layout")
                    }
                },
                Role::Field => match codecs.lookup(member.type_id) {
                    Some(entry) => self.bind_field(member, path, entry.codec.clone(), entry.bridge),
                    None => log::error!(
                        "{}.{} is declared as a field but {} has no codec",
                        layout.type_name,
                        member.name,
                        member.type_name
                    ),
                },
                Role::Composite => self.bind_composite(member, path),
                Role::Auto => match codecs.lookup(member.type_id) {
                    Some(entry) => self.bind_field(member, path, entry.codec.clone(), entry.bridge),
                    None => self.bind_composite(member, path),
                },
            }
        }
    }

    fn bind_field(&mut self, member: &Member, path: &[Step], codec: CodecRef, bridge: Bridge) {
        let type_name = self.type_name;
        let expected = codec.kind();
        let (read_path, write_path) = (path.to_vec(), path.to_vec());
        let (get, get_mut, fill) = (member.get, member.get_mut, member.fill);

        let binding = field_binding(
            codec,
            move |host| {
                let parent = walk(&read_path, host)
                    .ok_or(AccessError::WrongInstance { expected: type_name })?;
                get(parent).and_then(|m| bridge.read(m)).ok_or(AccessError::Absent)
            },
            move |host, value| {
                let found = value.kind();
                let mismatch = AccessError::KindMismatch { expected, found };
                let parent = walk_mut(&write_path, host)
                    .ok_or(AccessError::WrongInstance { expected: type_name })?;
                if let Some(slot) = get_mut(&mut *parent) {
                    return bridge.write(slot, value).map_err(|_| mismatch);
                }
                // An empty optional member gets a fresh value.
                let fill = fill.ok_or(AccessError::WrongInstance { expected: type_name })?;
                let boxed = bridge.create(value).map_err(|_| mismatch.clone())?;
                if fill(parent, boxed) {
                    Ok(())
                } else {
                    Err(mismatch)
                }
            },
        );
        self.insert_field(member.key, binding);
    }

    fn bind_composite(&mut self, member: &Member, path: &[Step]) {
        let type_name = self.type_name;
        let steps = path.to_vec();
        let (get_mut, fill, optional) = (member.get_mut, member.fill, member.optional);
        let (target_id, target_name) = (member.type_id, member.type_name);

        let binding = composite_binding(target_id, target_name, move |host, target, visit| {
            let parent = walk_mut(&steps, host)
                .ok_or(AccessError::WrongInstance { expected: type_name })?;
            if optional && get_mut(&mut *parent).is_none() {
                log::trace!("constructing absent {} in {type_name}", target.type_name);
                let fill = fill.ok_or(AccessError::Construct(target.type_name))?;
                if !fill(&mut *parent, target.create()) {
                    return Err(AccessError::Construct(target.type_name));
                }
            }
            let nested = get_mut(parent).ok_or(AccessError::Absent)?;
            visit(nested);
            Ok(())
        });
        self.insert_composite(member.key, binding);
    }

    pub(crate) fn insert_field(&mut self, key: &str, binding: FieldBinding) {
        if self.fields.contains_key(key) || self.composites.contains_key(key) {
            log::warn!("{} binds '{key}' twice, keeping the first binding", self.type_name);
            return;
        }
        self.fields.insert(key.to_owned(), binding);
    }

    pub(crate) fn insert_composite(&mut self, key: &str, binding: CompositeBinding) {
        if self.fields.contains_key(key) || self.composites.contains_key(key) {
            log::warn!("{} binds '{key}' twice, keeping the first binding", self.type_name);
            return;
        }
        self.composites.insert(key.to_owned(), binding);
    }

    /// Id of the bound type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the bound type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// A fresh instance of the bound type, boxed.
    pub fn create(&self) -> Box<dyn Any> {
        (self.factory)()
    }

    /// The plain bindings in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldBinding)> {
        self.fields.iter().map(|(k, b)| (k.as_str(), b))
    }

    /// The composite bindings in key order.
    pub fn composites(&self) -> impl Iterator<Item = (&str, &CompositeBinding)> {
        self.composites.iter().map(|(k, b)| (k.as_str(), b))
    }

    /// Copies values from `data` into `instance`.
    ///
    /// A composite member that is absent is constructed through its type's
    /// linker and stored back into the member before it is filled.
    pub fn forward_link(
        &self,
        data: &DataTree,
        instance: &mut dyn Any,
        lookup: &LinkerLookup,
    ) -> LinkReport {
        let mut report = LinkReport::default();
        if !self.accepts(&*instance, &mut report) {
            return report;
        }

        for (key, binding) in &self.fields {
            let Some(value) = data.get_value(key) else {
                report.fail(self.type_name, key, AccessError::Absent);
                continue;
            };
            match (binding.set)(&mut *instance, value.clone()) {
                Ok(()) => report.linked += 1,
                Err(err) => report.fail(self.type_name, key, err),
            }
        }

        let empty = DataTree::new();
        for (key, binding) in &self.composites {
            let Some(target) = lookup.get_by_id(binding.target) else {
                report.fail(self.type_name, key, AccessError::MissingLinker(binding.target_name));
                continue;
            };
            let sub_data = data.get_compound(key).unwrap_or(&empty);
            let mut nested = LinkReport::default();
            let resolved = (binding.resolve)(&mut *instance, target, &mut |member: &mut dyn Any| {
                nested = target.forward_link(sub_data, member, lookup);
            });
            report.merge(nested);
            if let Err(err) = resolved {
                report.fail(self.type_name, key, err);
            }
        }

        log::trace!("forward linked {} ({} values)", self.type_name, report.linked);
        report
    }

    /// Copies values from `instance` into `data`.
    pub fn backward_link(
        &self,
        data: &mut DataTree,
        instance: &mut dyn Any,
        lookup: &LinkerLookup,
    ) -> LinkReport {
        let mut report = LinkReport::default();
        if !self.accepts(&*instance, &mut report) {
            return report;
        }

        for (key, binding) in &self.fields {
            match (binding.get)(&*instance) {
                Ok(value) => {
                    data.put_value(key, value);
                    report.linked += 1;
                }
                Err(err) => report.fail(self.type_name, key, err),
            }
        }

        for (key, binding) in &self.composites {
            let Some(target) = lookup.get_by_id(binding.target) else {
                report.fail(self.type_name, key, AccessError::MissingLinker(binding.target_name));
                continue;
            };
            let sub_data = data.get_or_create_compound(key);
            let mut nested = LinkReport::default();
            let resolved = (binding.resolve)(&mut *instance, target, &mut |member: &mut dyn Any| {
                nested = target.backward_link(&mut *sub_data, member, lookup);
            });
            report.merge(nested);
            if let Err(err) = resolved {
                report.fail(self.type_name, key, err);
            }
        }

        log::trace!("backward linked {} ({} values)", self.type_name, report.linked);
        report
    }

    /// Typed form of [`Linker::forward_link`].
    pub fn forward_link_into<T: Any>(
        &self,
        data: &DataTree,
        instance: &mut T,
        lookup: &LinkerLookup,
    ) -> LinkReport {
        self.forward_link(data, instance, lookup)
    }

    /// Typed form of [`Linker::backward_link`].
    pub fn backward_link_from<T: Any>(
        &self,
        data: &mut DataTree,
        instance: &mut T,
        lookup: &LinkerLookup,
    ) -> LinkReport {
        self.backward_link(data, instance, lookup)
    }

    fn accepts(&self, instance: &dyn Any, report: &mut LinkReport) -> bool {
        if instance.type_id() == self.type_id {
            return true;
        }
        report.fail(
            self.type_name,
            "",
            AccessError::WrongInstance {
                expected: self.type_name,
            },
        );
        false
    }

    /// Derives the schema equivalent to this linker.
    ///
    /// Plain bindings contribute their codecs; composite bindings contribute
    /// nested schemas derived from their type's linker, named after that type.
    /// Composites without a registered linker are logged and left out.
    pub fn schema(&self, id: impl Into<String>, lookup: &LinkerLookup) -> Schema {
        self.schema_with(id, lookup, false)
    }

    /// Like [`Linker::schema`], with `versioned` applied to the derived
    /// schema and every nested schema below it.
    pub fn schema_with(
        &self,
        id: impl Into<String>,
        lookup: &LinkerLookup,
        versioned: bool,
    ) -> Schema {
        let mut schema = Schema::new(id);
        schema.set_versioned(versioned);
        for (key, binding) in &self.fields {
            schema.add_field(key.as_str(), binding.codec.clone());
        }
        for (key, binding) in &self.composites {
            match lookup.get_by_id(binding.target) {
                Some(target) => {
                    let id = layout::short_type_name(binding.target_name);
                    let nested = target.schema_with(id, lookup, versioned);
                    schema.add_nested(key.as_str(), nested);
                }
                None => log::error!(
                    "cannot derive schema for {}.{key}: no linker registered for {}",
                    self.type_name,
                    binding.target_name
                ),
            }
        }
        schema
    }
}
