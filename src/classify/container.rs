use std::collections::HashMap;
use std::fmt;

use crate::custom::CustomData;
use crate::tag::Compound;

/// A host object that carries a persisted tag tree.
///
/// Classifiers select containers by [`Container::kind`]; the data objects
/// created for a container are cached in its [`Attachments`] for as long as
/// the container lives.
pub trait Container {
    /// What classifiers match against.
    type Kind: PartialEq + fmt::Debug;

    /// The kind of this container.
    fn kind(&self) -> &Self::Kind;

    /// The persisted tree.
    fn tree(&self) -> &Compound;

    /// The persisted tree and the attachment cache, borrowed together.
    fn parts_mut(&mut self) -> (&mut Compound, &mut Attachments);
}

/// Per-container cache of data objects, keyed by classifier id.
///
/// The cache only memoizes reads; the container's tree stays the source of
/// truth and is written back by [`DataRegistry::on_save`](super::DataRegistry::on_save).
#[derive(Default)]
pub struct Attachments {
    entries: HashMap<u64, Box<dyn CustomData>>,
}

impl Attachments {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an object is cached for the classifier.
    pub fn contains(&self, classifier: u64) -> bool {
        self.entries.contains_key(&classifier)
    }

    /// The object cached for the classifier.
    pub fn get(&self, classifier: u64) -> Option<&dyn CustomData> {
        self.entries.get(&classifier).map(|d| &**d)
    }

    pub(crate) fn get_or_insert_with<F>(
        &mut self,
        classifier: u64,
        create: F,
    ) -> &mut Box<dyn CustomData>
    where
        F: FnOnce() -> Box<dyn CustomData>,
    {
        self.entries.entry(classifier).or_insert_with(create)
    }

    pub(crate) fn select(&mut self, classifiers: &[u64]) -> Vec<&mut dyn CustomData> {
        let mut by_id: HashMap<u64, &mut Box<dyn CustomData>> =
            self.entries.iter_mut().map(|(id, data)| (*id, data)).collect();
        let mut selected: Vec<&mut dyn CustomData> = Vec::with_capacity(classifiers.len());
        for id in classifiers {
            if let Some(data) = by_id.remove(id) {
                selected.push(&mut **data);
            }
        }
        selected
    }

    /// Number of cached objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached object.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Debug for Attachments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(id, data)| (id, data.category())))
            .finish()
    }
}

/// A ready-made container: a kind, a count and a tree.
#[derive(Debug)]
pub struct Stack<K> {
    kind: K,
    count: u32,
    tree: Compound,
    attachments: Attachments,
}

impl<K> Stack<K> {
    /// A single item of `kind` with an empty tree.
    pub fn new(kind: K) -> Self {
        Self::with_tree(kind, Compound::new())
    }

    /// A single item of `kind` carrying `tree`.
    pub fn with_tree(kind: K, tree: Compound) -> Self {
        Self {
            kind,
            count: 1,
            tree,
            attachments: Attachments::new(),
        }
    }

    /// The item count.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Sets the item count.
    pub fn set_count(&mut self, count: u32) {
        self.count = count;
    }

    /// The attachment cache.
    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }
}

impl<K: PartialEq + fmt::Debug> Container for Stack<K> {
    type Kind = K;

    fn kind(&self) -> &K {
        &self.kind
    }

    fn tree(&self) -> &Compound {
        &self.tree
    }

    fn parts_mut(&mut self) -> (&mut Compound, &mut Attachments) {
        (&mut self.tree, &mut self.attachments)
    }
}
