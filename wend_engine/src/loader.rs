//! Map-file loader.
//!
//! Builds a [`MapRegistry`] from the JSON load format: origin blocks with
//! `wayto` tables plus loose top-level entries forming the global pool.
//! Structural problems (bad JSON, an entry that is neither a string nor a
//! block, non-string transition text) fail the load outright; data-quality
//! problems (duplicate keys, non-numeric target ids, snippets that fail to
//! parse) are collected as [`DataIssue`]s and logged, never silently
//! repaired.

mod raw;

use std::fmt;
use std::fs;
use std::path::Path;

use log::{info, warn};
use thiserror::Error;

use wend_script::ScriptError;

use crate::id::{MapId, NodeId};
use crate::registry::{MapNode, MapRegistry, NodeInfo};
use crate::table::WaytoTable;
use crate::transition::Transition;

use raw::{RawBlock, RawEntry, RawMapFile};

/// Structural failures that abort a load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading map file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing map data: {0}")]
    Json(#[from] serde_json::Error),
}

/// A defect in otherwise-loadable map data. The loader resolves each one
/// deterministically (last entry wins, bad entries skipped) and reports
/// what it did.
#[derive(Debug, Clone, PartialEq)]
pub enum DataIssue {
    /// A target id appeared more than once in one scope; the last entry won.
    DuplicateTarget { map: Option<MapId>, target: NodeId },
    /// An origin label appeared more than once; the last block won.
    DuplicateMap { map: MapId },
    /// A wayto key that is not a node id; the entry was skipped.
    BadTargetId { map: Option<MapId>, key: String },
    /// A marked snippet that fails to parse; the entry was skipped.
    BadSnippet {
        map: Option<MapId>,
        target: NodeId,
        error: ScriptError,
    },
}

fn scope(map: Option<&MapId>) -> String {
    map.map_or_else(|| "global pool".to_string(), |id| format!("map `{id}`"))
}

impl fmt::Display for DataIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataIssue::DuplicateTarget { map, target } => {
                write!(f, "duplicate target {target} in {} (last entry wins)", scope(map.as_ref()))
            },
            DataIssue::DuplicateMap { map } => {
                write!(f, "duplicate origin block `{map}` (last block wins)")
            },
            DataIssue::BadTargetId { map, key } => {
                write!(f, "non-numeric target key '{key}' in {} (skipped)", scope(map.as_ref()))
            },
            DataIssue::BadSnippet { map, target, error } => {
                write!(f, "unparseable snippet for target {target} in {}: {error} (skipped)", scope(map.as_ref()))
            },
        }
    }
}

/// Result of a load: the registry plus every data-quality issue found.
#[derive(Debug, Default)]
pub struct LoadedMaps {
    pub registry: MapRegistry,
    pub issues: Vec<DataIssue>,
}

/// Load map data from a file on disk.
///
/// # Errors
/// [`LoadError::Io`] when the file cannot be read, [`LoadError::Json`]
/// when its contents are structurally invalid.
pub fn load_file(path: &Path) -> Result<LoadedMaps, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_str(&text)
}

/// Load map data from a JSON string.
///
/// # Errors
/// [`LoadError::Json`] when the text is structurally invalid.
pub fn load_str(text: &str) -> Result<LoadedMaps, LoadError> {
    let raw: RawMapFile = serde_json::from_str(text)?;
    let mut registry = MapRegistry::new();
    let mut issues = Vec::new();
    let mut loose = 0usize;

    for (label, entry) in raw.entries {
        match entry {
            RawEntry::Loose(text) => {
                loose += 1;
                load_pool_entry(&mut registry, &mut issues, label, &text);
            },
            RawEntry::Block(block) => {
                let map = MapId::from(label);
                let node = build_map_node(&map, block, &mut issues);
                if registry.insert_map(map.clone(), node).is_some() {
                    issues.push(DataIssue::DuplicateMap { map });
                }
            },
        }
    }

    for issue in &issues {
        warn!("map data: {issue}");
    }
    info!(
        "{} origin blocks loaded, {} loose pool entries, {} data issues",
        registry.len(),
        loose,
        issues.len()
    );
    Ok(LoadedMaps { registry, issues })
}

fn load_pool_entry(registry: &mut MapRegistry, issues: &mut Vec<DataIssue>, key: String, text: &str) {
    let Ok(target) = key.parse::<NodeId>() else {
        issues.push(DataIssue::BadTargetId { map: None, key });
        return;
    };
    match Transition::parse(text) {
        Ok(transition) => {
            if registry.insert_loose(target, transition).is_some() {
                issues.push(DataIssue::DuplicateTarget { map: None, target });
            }
        },
        Err(error) => issues.push(DataIssue::BadSnippet {
            map: None,
            target,
            error,
        }),
    }
}

fn build_map_node(map: &MapId, block: RawBlock, issues: &mut Vec<DataIssue>) -> MapNode {
    let mut node = MapNode {
        info: NodeInfo {
            title: block.title,
            location: block.location,
            tags: block.tags,
            uids: block.uids,
        },
        wayto: WaytoTable::new(),
    };
    for (key, text) in block.wayto {
        let Ok(target) = key.parse::<NodeId>() else {
            issues.push(DataIssue::BadTargetId {
                map: Some(map.clone()),
                key,
            });
            continue;
        };
        match Transition::parse(&text) {
            Ok(transition) => {
                if node.wayto.insert(target, transition).is_some() {
                    issues.push(DataIssue::DuplicateTarget {
                        map: Some(map.clone()),
                        target,
                    });
                }
            },
            Err(error) => issues.push(DataIssue::BadSnippet {
                map: Some(map.clone()),
                target,
                error,
            }),
        }
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_round_trips_every_registered_transition() {
        let loaded = load_str(
            r#"{"town": {"wayto": {
                "29034": "northeast",
                "28998": "go ladder",
                "30716": ";e true"
            }}}"#,
        )
        .unwrap();
        assert!(loaded.issues.is_empty());
        let node = loaded.registry.map(&MapId::from("town")).unwrap();
        assert_eq!(node.wayto.len(), 3);
        assert_eq!(node.wayto.lookup(NodeId::new(29034)).unwrap().text(), "northeast");
        assert_eq!(node.wayto.lookup(NodeId::new(28998)).unwrap().text(), "go ladder");
        assert!(node.wayto.lookup(NodeId::new(30716)).unwrap().is_script());
    }

    #[test]
    fn duplicate_targets_report_and_last_wins() {
        let loaded = load_str(
            r#"{"guild": {"wayto": {
                "18348": "north",
                "18348": ";e fput 'look tool'; move 'go panel'"
            }}}"#,
        )
        .unwrap();
        assert_eq!(
            loaded.issues,
            vec![DataIssue::DuplicateTarget {
                map: Some(MapId::from("guild")),
                target: NodeId::new(18348),
            }]
        );
        let node = loaded.registry.map(&MapId::from("guild")).unwrap();
        assert!(node.wayto.lookup(NodeId::new(18348)).unwrap().is_script());
    }

    #[test]
    fn duplicate_origin_blocks_report_and_last_wins() {
        let loaded = load_str(
            r#"{
                "7": {"wayto": {"1": "north"}},
                "7": {"wayto": {"2": "south"}}
            }"#,
        )
        .unwrap();
        assert_eq!(
            loaded.issues,
            vec![DataIssue::DuplicateMap { map: MapId::from("7") }]
        );
        let node = loaded.registry.map(&MapId::from("7")).unwrap();
        assert!(node.wayto.lookup(NodeId::new(1)).is_none());
        assert!(node.wayto.lookup(NodeId::new(2)).is_some());
    }

    #[test]
    fn non_numeric_target_key_is_skipped_and_reported() {
        let loaded = load_str(r#"{"town": {"wayto": {"ladder": "go ladder"}}}"#).unwrap();
        assert_eq!(
            loaded.issues,
            vec![DataIssue::BadTargetId {
                map: Some(MapId::from("town")),
                key: "ladder".to_string(),
            }]
        );
        assert!(loaded.registry.map(&MapId::from("town")).unwrap().wayto.is_empty());
    }

    #[test]
    fn unparseable_snippet_is_skipped_with_error_retained() {
        let loaded = load_str(
            r#"{"guild": {"wayto": {"29773": ";e fput 'speak'; language until language"}}}"#,
        )
        .unwrap();
        assert_eq!(loaded.issues.len(), 1);
        assert!(matches!(
            &loaded.issues[0],
            DataIssue::BadSnippet { target, error: ScriptError::Unsupported(_), .. }
                if *target == NodeId::new(29773)
        ));
        assert!(loaded.registry.map(&MapId::from("guild")).unwrap().wayto.is_empty());
    }

    #[test]
    fn loose_entries_land_in_the_global_pool() {
        let loaded = load_str(
            r#"{
                "30716": ";e true",
                "town": {"wayto": {"29034": "northeast"}}
            }"#,
        )
        .unwrap();
        assert!(loaded.issues.is_empty());
        assert!(loaded.registry.pool().lookup(NodeId::new(30716)).unwrap().is_script());
        // pool consulted on origin-table miss
        let resolved = loaded
            .registry
            .resolve(&MapId::from("town"), NodeId::new(30716))
            .unwrap();
        assert!(resolved.is_script());
    }

    #[test]
    fn invalid_json_is_a_hard_error() {
        assert!(matches!(load_str("not json"), Err(LoadError::Json(_))));
        assert!(matches!(load_str(r#"{"29034": 17}"#), Err(LoadError::Json(_))));
    }

    #[test]
    fn metadata_is_captured_into_node_info() {
        let loaded = load_str(
            r#"{"28908": {
                "title": "Wagon Camp",
                "location": "Bloodriven Village",
                "tags": ["event"],
                "uid": [4028908],
                "wayto": {}
            }}"#,
        )
        .unwrap();
        let node = loaded.registry.map(&MapId::from("28908")).unwrap();
        assert_eq!(node.info.title.as_deref(), Some("Wagon Camp"));
        assert_eq!(node.info.location.as_deref(), Some("Bloodriven Village"));
        assert_eq!(node.info.tags, vec!["event"]);
        assert_eq!(node.info.uids, vec![4_028_908]);
    }
}
