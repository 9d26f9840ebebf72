//! Identifier newtypes for map blocks and nodes.
//!
//! A [`NodeId`] names one location in the game world; wayto tables are
//! keyed by the target node. A [`MapId`] names one origin block (one
//! "map") in the loaded data, and is what cross-map calls (`Map[7]`)
//! address. Map labels are opaque strings: numeric in the stock map
//! database, but nothing here depends on that.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Opaque integer identity of a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(id: u32) -> Self {
        NodeId(id)
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(NodeId)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        NodeId(id)
    }
}

/// Opaque label identifying one origin block in the loaded map data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapId(String);

impl MapId {
    pub fn new(label: impl Into<String>) -> Self {
        MapId(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MapId {
    fn from(label: &str) -> Self {
        MapId(label.to_string())
    }
}

impl From<String> for MapId {
    fn from(label: String) -> Self {
        MapId(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_parses_from_wayto_keys() {
        let id: NodeId = "29034".parse().unwrap();
        assert_eq!(id, NodeId::new(29034));
        assert_eq!(id.to_string(), "29034");
    }

    #[test]
    fn node_id_rejects_non_numeric_keys() {
        assert!("ladder".parse::<NodeId>().is_err());
        assert!("".parse::<NodeId>().is_err());
    }

    #[test]
    fn map_id_round_trips_labels() {
        let id = MapId::from("7");
        assert_eq!(id.as_str(), "7");
        assert_eq!(id, MapId::new("7".to_string()));
    }
}
