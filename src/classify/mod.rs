//! Classifiers and the per-container data registry.
//!
//! A [`Classifier`] is a predicate over containers. Registering it in a
//! [`DataRegistry`] together with a factory (or a schema) attaches one data
//! object to every container it matches. A container may match several
//! classifiers; each match gets its own object, created on first access and
//! cached in the container's [`Attachments`].
//!
//! Classifiers built from a single kind are [`Safety::Single`]: they match at
//! most one entry for any container and may be used with
//! [`DataRegistry::get`]. Classifiers built from several kinds are
//! [`Safety::Multi`] and must go through [`DataRegistry::get_all`].

mod container;
mod registry;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub use container::{Attachments, Container, Stack};
pub use registry::DataRegistry;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Whether a classifier can be used for single-result lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Safety {
    /// Matches a single kind or value.
    Single,
    /// May match containers of several kinds.
    Multi,
}

/// A predicate selecting containers.
///
/// Identity is by id: clones share it, separately built classifiers never do,
/// even with identical predicates.
pub struct Classifier<C: Container> {
    id: u64,
    safety: Safety,
    predicate: Arc<dyn Fn(&C) -> bool + Send + Sync>,
}

impl<C: Container + 'static> Classifier<C> {
    /// Matches containers of exactly `kind`.
    pub fn of(kind: C::Kind) -> Self
    where
        C::Kind: Send + Sync + 'static,
    {
        Self::custom(Safety::Single, move |c: &C| c.kind() == &kind)
    }

    /// Matches containers of any of `kinds`.
    pub fn any_of(kinds: impl IntoIterator<Item = C::Kind>) -> Self
    where
        C::Kind: Send + Sync + 'static,
    {
        let kinds: Vec<C::Kind> = kinds.into_iter().collect();
        Self::custom(Safety::Multi, move |c: &C| kinds.contains(c.kind()))
    }

    /// Matches with an arbitrary predicate of the declared safety.
    pub fn custom<F>(safety: Safety, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            safety,
            predicate: Arc::new(predicate),
        }
    }
}

impl<C: Container> Classifier<C> {
    /// The unique id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The declared safety.
    pub fn safety(&self) -> Safety {
        self.safety
    }

    /// Whether `container` is selected.
    pub fn matches(&self, container: &C) -> bool {
        (self.predicate)(container)
    }
}

impl<C: Container> Clone for Classifier<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            safety: self.safety,
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C: Container> PartialEq for Classifier<C> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<C: Container> Eq for Classifier<C> {}

impl<C: Container> fmt::Debug for Classifier<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("id", &self.id)
            .field("safety", &self.safety)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Item {
        Sword,
        Axe,
        Apple,
    }

    #[test]
    fn identity_survives_cloning_only() {
        let a = Classifier::<Stack<Item>>::of(Item::Sword);
        let b = Classifier::<Stack<Item>>::of(Item::Sword);
        assert_eq!(a.clone(), a);
        assert_ne!(a, b);
    }

    #[test]
    fn any_of_is_multi() {
        let tools = Classifier::<Stack<Item>>::any_of([Item::Sword, Item::Axe]);
        assert_eq!(tools.safety(), Safety::Multi);
        assert!(tools.matches(&Stack::new(Item::Axe)));
        assert!(!tools.matches(&Stack::new(Item::Apple)));
    }
}
