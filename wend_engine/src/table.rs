//! Per-origin wayto table.

use std::collections::HashMap;

use crate::id::NodeId;
use crate::transition::Transition;

/// Mapping from destination node id to the transition that reaches it,
/// scoped to one origin. Within a table each target appears at most once;
/// the loader reports violations of that invariant as data-quality issues.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaytoTable {
    edges: HashMap<NodeId, Transition>,
}

impl WaytoTable {
    pub fn new() -> Self {
        WaytoTable::default()
    }

    /// Register a transition for `target`; returns the displaced entry
    /// when the target was already present.
    pub fn insert(&mut self, target: NodeId, transition: Transition) -> Option<Transition> {
        self.edges.insert(target, transition)
    }

    /// The transition registered for `target`, if any.
    pub fn lookup(&self, target: NodeId) -> Option<&Transition> {
        self.edges.get(&target)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Transition)> {
        self.edges.iter().map(|(id, transition)| (*id, transition))
    }
}
