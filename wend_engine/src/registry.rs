//! Cross-map registry of wayto tables.
//!
//! Scripts may invoke another origin's transition (`Map[7].wayto['3668']`),
//! so tables are collected under an explicit registry keyed by map label
//! and the executor resolves foreign edges through it; tables never hold
//! references to each other. Loose top-level entries form a global pool
//! consulted when an origin-scoped lookup misses.
//!
//! The registry is built once by the loader and read-only afterwards, so
//! it can be shared freely across sessions without locking.

use std::collections::HashMap;

use thiserror::Error;

use crate::id::{MapId, NodeId};
use crate::table::WaytoTable;
use crate::transition::Transition;

/// Lookup failures surfaced by [`MapRegistry::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("map `{0}` is not registered")]
    UnknownMap(MapId),
    #[error("no transition from map `{map}` to node {target}")]
    NotFound { map: MapId, target: NodeId },
}

/// Display metadata carried by origin blocks; consumed by external map
/// tooling (selection by tag or location) and summaries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeInfo {
    pub title: Option<String>,
    pub location: Option<String>,
    pub tags: Vec<String>,
    pub uids: Vec<u32>,
}

/// One origin block: its metadata and its wayto table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapNode {
    pub info: NodeInfo,
    pub wayto: WaytoTable,
}

/// All loaded origin tables plus the global pool of loose entries.
#[derive(Debug, Clone, Default)]
pub struct MapRegistry {
    maps: HashMap<MapId, MapNode>,
    pool: WaytoTable,
}

impl MapRegistry {
    pub fn new() -> Self {
        MapRegistry::default()
    }

    /// Register an origin block; returns the displaced block when the
    /// label was already present.
    pub fn insert_map(&mut self, id: MapId, node: MapNode) -> Option<MapNode> {
        self.maps.insert(id, node)
    }

    /// Register a loose entry in the global pool; returns the displaced
    /// transition when the target was already present.
    pub fn insert_loose(&mut self, target: NodeId, transition: Transition) -> Option<Transition> {
        self.pool.insert(target, transition)
    }

    pub fn map(&self, id: &MapId) -> Option<&MapNode> {
        self.maps.get(id)
    }

    pub fn pool(&self) -> &WaytoTable {
        &self.pool
    }

    pub fn maps(&self) -> impl Iterator<Item = (&MapId, &MapNode)> {
        self.maps.iter()
    }

    /// Number of registered origin blocks.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Resolve an edge: origin-scoped lookup, falling back to the global
    /// pool when the origin's table has no entry for `target`.
    ///
    /// # Errors
    /// [`LookupError::UnknownMap`] when no block is registered under
    /// `map`; [`LookupError::NotFound`] when neither the origin table nor
    /// the pool knows `target`.
    pub fn resolve(&self, map: &MapId, target: NodeId) -> Result<&Transition, LookupError> {
        let node = self
            .maps
            .get(map)
            .ok_or_else(|| LookupError::UnknownMap(map.clone()))?;
        node.wayto
            .lookup(target)
            .or_else(|| self.pool.lookup(target))
            .ok_or_else(|| LookupError::NotFound {
                map: map.clone(),
                target,
            })
    }

    /// Origin blocks carrying `tag` in their metadata.
    pub fn tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = (&'a MapId, &'a MapNode)> {
        self.maps
            .iter()
            .filter(move |(_, node)| node.info.tags.iter().any(|t| t == tag))
    }

    /// Origin blocks whose metadata places them in `location`.
    pub fn in_location<'a>(&'a self, location: &'a str) -> impl Iterator<Item = (&'a MapId, &'a MapNode)> {
        self.maps
            .iter()
            .filter(move |(_, node)| node.info.location.as_deref() == Some(location))
    }
}
