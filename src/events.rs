//! Pipeline hooks.
//!
//! The engine reports each phase of its pipeline to every registered
//! listener. Listeners observe the sub-tree being processed; they cannot
//! change it.

use std::fmt;

use crate::tag::Compound;

/// A step of the engine pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before a data tree is written to the tag tree.
    PreSerialize,
    /// After a data tree was written to the tag tree.
    PostSerialize,
    /// Before the tag tree is read into a data tree.
    PreDeserialize,
    /// After the tag tree was read into a data tree.
    PostDeserialize,
    /// Before a data tree is copied into an object.
    PreForwardLink,
    /// After a data tree was copied into an object.
    PostForwardLink,
    /// Before an object is copied into a data tree.
    PreBackwardLink,
    /// After an object was copied into a data tree.
    PostBackwardLink,
}

/// What a listener receives.
#[derive(Debug)]
pub struct Event<'a> {
    /// The phase being reported.
    pub phase: Phase,
    /// The schema id or custom-data category being processed.
    pub category: &'a str,
    /// The sub-tree of that schema or category.
    pub tree: &'a Compound,
}

type Listener = Box<dyn Fn(&Event<'_>) + Send + Sync>;

/// Listeners, called in registration order.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(Option<Phase>, Listener)>,
}

impl EventBus {
    /// An empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for every phase.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&Event<'_>) + Send + Sync + 'static,
    {
        self.listeners.push((None, Box::new(listener)));
    }

    /// Registers a listener for one phase.
    pub fn subscribe_to<F>(&mut self, phase: Phase, listener: F)
    where
        F: Fn(&Event<'_>) + Send + Sync + 'static,
    {
        self.listeners.push((Some(phase), Box::new(listener)));
    }

    /// Calls every listener interested in `phase`.
    pub fn emit(&self, phase: Phase, category: &str, tree: &Compound) {
        if self.listeners.is_empty() {
            return;
        }
        let event = Event { phase, category, tree };
        for (filter, listener) in &self.listeners {
            if filter.map_or(true, |p| p == phase) {
                listener(&event);
            }
        }
    }

    /// Number of listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus").field("listeners", &self.listeners.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn filtered_listeners_only_see_their_phase() {
        let all = Arc::new(AtomicUsize::new(0));
        let serialize = Arc::new(AtomicUsize::new(0));

        let mut bus = EventBus::new();
        let counter = Arc::clone(&all);
        bus.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&serialize);
        bus.subscribe_to(Phase::PostSerialize, move |event| {
            assert_eq!(event.category, "stats");
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let tree = Compound::new();
        bus.emit(Phase::PreSerialize, "stats", &tree);
        bus.emit(Phase::PostSerialize, "stats", &tree);

        assert_eq!(all.load(Ordering::SeqCst), 2);
        assert_eq!(serialize.load(Ordering::SeqCst), 1);
    }
}
