use std::fmt;
use std::sync::Arc;

use super::{Classifier, Container, Safety};
use crate::codec::Registration;
use crate::config::EngineConfig;
use crate::custom::{CustomData, SchemaData};
use crate::engine::prime_custom;
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::tag::Compound;

type Factory = Box<dyn Fn() -> Box<dyn CustomData> + Send + Sync>;

struct Entry<C: Container> {
    classifier: Classifier<C>,
    factory: Factory,
}

/// Classifiers and the factories of the data objects they attach.
///
/// Entries are kept in registration order, which is the order every query
/// visits them in.
///
/// ```rust
/// use nbtlink::classify::{Classifier, DataRegistry, Stack};
/// use nbtlink::custom::SchemaData;
/// use nbtlink::Schema;
///
/// #[derive(Debug, PartialEq)]
/// enum Item { Sword, Apple }
///
/// let swords = Classifier::<Stack<Item>>::of(Item::Sword);
/// let mut registry = DataRegistry::new();
/// registry.register_schema(swords.clone(), Schema::builder("durability").int("uses").build());
///
/// let mut sword = Stack::new(Item::Sword);
/// let data = registry.get_as::<SchemaData>(&mut sword, &swords)?;
/// assert_eq!(data.map(|d| d.data().get::<i32>("uses")), Some(0));
///
/// let mut apple = Stack::new(Item::Apple);
/// assert!(registry.get_all(&mut apple).is_empty());
/// # Ok::<(), nbtlink::Error>(())
/// ```
pub struct DataRegistry<C: Container> {
    entries: Vec<Entry<C>>,
    strict: bool,
}

impl<C: Container + 'static> DataRegistry<C> {
    /// An empty registry that rejects multi-match classifiers in [`DataRegistry::get`].
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    /// An empty registry following [`EngineConfig::strict_classifiers`].
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            entries: Vec::new(),
            strict: config.strict_classifiers,
        }
    }

    /// Attaches objects built by `factory` to every container `classifier`
    /// matches. A classifier can only be registered once.
    pub fn register<D, F>(&mut self, classifier: Classifier<C>, factory: F) -> Registration
    where
        D: CustomData,
        F: Fn() -> D + Send + Sync + 'static,
    {
        if self.entries.iter().any(|e| e.classifier == classifier) {
            log::warn!("classifier {} is already registered", classifier.id());
            return Registration::Duplicate;
        }
        self.entries.push(Entry {
            classifier,
            factory: Box::new(move || Box::new(factory()) as Box<dyn CustomData>),
        });
        Registration::Fresh
    }

    /// Attaches a [`SchemaData`] of `schema` to every matching container.
    pub fn register_schema(
        &mut self,
        classifier: Classifier<C>,
        schema: impl Into<Arc<Schema>>,
    ) -> Registration {
        let schema = schema.into();
        self.register(classifier, move || SchemaData::new(Arc::clone(&schema)))
    }

    /// Number of registered classifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn matching_ids(&self, container: &C) -> Vec<u64> {
        self.entries
            .iter()
            .filter(|e| e.classifier.matches(container))
            .map(|e| e.classifier.id())
            .collect()
    }

    /// Creates the missing objects for `ids`, primed from the container tree.
    fn ensure(&self, container: &mut C, ids: &[u64]) {
        let (tree, attachments) = container.parts_mut();
        for entry in self.entries.iter().filter(|e| ids.contains(&e.classifier.id())) {
            attachments.get_or_insert_with(entry.classifier.id(), || {
                let mut data = (entry.factory)();
                let category = data.category().to_owned();
                log::trace!("attaching '{category}' for classifier {}", entry.classifier.id());
                prime_custom(&mut *data, tree.get_or_create_compound(&category));
                data
            });
        }
    }

    // --- QUERIES ---

    /// Calls `action` with every data object attached to `container`, in
    /// registration order.
    pub fn for_all_matching<F>(&self, container: &mut C, mut action: F)
    where
        F: FnMut(&Classifier<C>, &mut dyn CustomData),
    {
        let matching: Vec<&Entry<C>> = self
            .entries
            .iter()
            .filter(|e| e.classifier.matches(container))
            .collect();
        let ids: Vec<u64> = matching.iter().map(|e| e.classifier.id()).collect();
        self.ensure(container, &ids);

        let (_, attachments) = container.parts_mut();
        for (entry, data) in matching.into_iter().zip(attachments.select(&ids)) {
            action(&entry.classifier, data);
        }
    }

    /// Every data object attached to `container`, in registration order.
    pub fn get_all<'c>(&self, container: &'c mut C) -> Vec<&'c mut dyn CustomData> {
        let ids = self.matching_ids(container);
        self.ensure(container, &ids);
        let (_, attachments) = container.parts_mut();
        attachments.select(&ids)
    }

    /// The data object `classifier` attaches to `container`, if it matches.
    ///
    /// # Errors
    /// [`Error::UnsafeClassifier`] for a [`Safety::Multi`] classifier while
    /// strict classifiers are on. Otherwise the misuse is logged and the
    /// classifier's own entry is returned.
    pub fn get<'c>(
        &self,
        container: &'c mut C,
        classifier: &Classifier<C>,
    ) -> Result<Option<&'c mut dyn CustomData>> {
        if classifier.safety() == Safety::Multi {
            if self.strict {
                return Err(Error::UnsafeClassifier(classifier.id()));
            }
            log::error!(
                "classifier {} may match several entries, use get_all; returning its first match",
                classifier.id()
            );
        }

        let Some(entry) = self.entries.iter().find(|e| e.classifier == *classifier) else {
            log::debug!("classifier {} is not registered", classifier.id());
            return Ok(None);
        };
        if !entry.classifier.matches(container) {
            return Ok(None);
        }

        let ids = [entry.classifier.id()];
        self.ensure(container, &ids);
        let (_, attachments) = container.parts_mut();
        Ok(attachments.select(&ids).pop())
    }

    /// [`DataRegistry::get`], downcast to `T`.
    ///
    /// # Errors
    /// As [`DataRegistry::get`].
    pub fn get_as<'c, T: CustomData>(
        &self,
        container: &'c mut C,
        classifier: &Classifier<C>,
    ) -> Result<Option<&'c mut T>> {
        Ok(self
            .get(container, classifier)?
            .and_then(|data| data.as_any_mut().downcast_mut::<T>()))
    }

    // --- COMPUTE HELPERS ---

    /// Runs `action` on every attached object. Returns whether there was any.
    pub fn compute_all<F>(&self, container: &mut C, mut action: F) -> bool
    where
        F: FnMut(&mut dyn CustomData),
    {
        let all = self.get_all(container);
        let found = !all.is_empty();
        for data in all {
            action(data);
        }
        found
    }

    /// Runs `action` on the object `classifier` attaches. Returns whether it matched.
    ///
    /// # Errors
    /// As [`DataRegistry::get`].
    pub fn compute<F>(
        &self,
        container: &mut C,
        classifier: &Classifier<C>,
        action: F,
    ) -> Result<bool>
    where
        F: FnOnce(&mut dyn CustomData),
    {
        Ok(match self.get(container, classifier)? {
            Some(data) => {
                action(data);
                true
            }
            None => false,
        })
    }

    /// Like [`DataRegistry::compute`], but only when `predicate` accepts the object.
    ///
    /// # Errors
    /// As [`DataRegistry::get`].
    pub fn compute_if<P, F>(
        &self,
        container: &mut C,
        classifier: &Classifier<C>,
        predicate: P,
        action: F,
    ) -> Result<bool>
    where
        P: FnOnce(&dyn CustomData) -> bool,
        F: FnOnce(&mut dyn CustomData),
    {
        let Some(data) = self.get(container, classifier)? else {
            return Ok(false);
        };
        if !predicate(&*data) {
            return Ok(false);
        }
        action(data);
        Ok(true)
    }

    /// Like [`DataRegistry::compute_all`], restricted to objects `predicate` accepts.
    pub fn compute_all_if<P, F>(&self, container: &mut C, mut predicate: P, mut action: F) -> bool
    where
        P: FnMut(&dyn CustomData) -> bool,
        F: FnMut(&mut dyn CustomData),
    {
        let mut found = false;
        for data in self.get_all(container) {
            if predicate(&*data) {
                action(data);
                found = true;
            }
        }
        found
    }

    /// [`DataRegistry::compute_all`] that requires at least one object.
    ///
    /// # Errors
    /// [`Error::NoMatch`] when nothing is attached to `container`.
    pub fn compute_all_or_fail<F>(&self, container: &mut C, action: F) -> Result<()>
    where
        F: FnMut(&mut dyn CustomData),
    {
        if self.compute_all(container, action) {
            Ok(())
        } else {
            Err(Error::NoMatch)
        }
    }

    /// [`DataRegistry::compute`] that requires a match.
    ///
    /// # Errors
    /// [`Error::NoMatch`] when `classifier` does not match, or as
    /// [`DataRegistry::get`].
    pub fn compute_or_fail<F>(
        &self,
        container: &mut C,
        classifier: &Classifier<C>,
        action: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut dyn CustomData),
    {
        if self.compute(container, classifier, action)? {
            Ok(())
        } else {
            Err(Error::NoMatch)
        }
    }

    // --- CONTAINER LIFECYCLE ---

    /// Installs a freshly loaded tree in `container` and attaches every
    /// matching data object, read from that tree.
    pub fn on_load(&self, container: &mut C, tree: &Compound) {
        {
            let (own, attachments) = container.parts_mut();
            *own = tree.clone();
            attachments.clear();
        }
        let ids = self.matching_ids(container);
        self.ensure(container, &ids);
        log::debug!("loaded container with {} attachment(s)", ids.len());
    }

    /// Writes every attached object back into the container tree and into
    /// `tree`, the outgoing serialized form, which is returned.
    pub fn on_save(&self, container: &mut C, mut tree: Compound) -> Compound {
        let ids = self.matching_ids(container);
        let (own, attachments) = container.parts_mut();
        for id in ids {
            let Some(data) = attachments.get(id) else {
                continue;
            };
            let sub_tree = own.get_or_create_compound(data.category());
            sub_tree.clear();
            data.write_to(sub_tree);
            tree.put_compound(data.category(), sub_tree.clone());
        }
        tree
    }
}

impl<C: Container + 'static> Default for DataRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Container> fmt::Debug for DataRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let classifiers: Vec<u64> = self.entries.iter().map(|e| e.classifier.id()).collect();
        f.debug_struct("DataRegistry")
            .field("classifiers", &classifiers)
            .field("strict", &self.strict)
            .finish()
    }
}
