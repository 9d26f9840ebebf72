//! Raw deserialization of map-file JSON.
//!
//! Duplicate keys matter to the loader: deserializing into a map type
//! would coalesce them before anyone could report the collision. The raw
//! layer keeps every key/value pair in document order via custom visitors
//! and leaves interpretation to the loader proper.

use std::fmt;

use serde::de::{Deserialize, Deserializer, IgnoredAny, MapAccess, Visitor};

/// Top-level file contents: every entry in document order.
#[derive(Debug, Default)]
pub struct RawMapFile {
    pub entries: Vec<(String, RawEntry)>,
}

/// One top-level entry: either a loose pool script keyed by node id, or
/// an origin block keyed by map label.
#[derive(Debug)]
pub enum RawEntry {
    Loose(String),
    Block(RawBlock),
}

/// An origin block: its wayto pairs (duplicates preserved) and whatever
/// display metadata it carries. Unknown fields are ignored.
#[derive(Debug, Default)]
pub struct RawBlock {
    pub wayto: Vec<(String, String)>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub tags: Vec<String>,
    pub uids: Vec<u32>,
}

impl<'de> Deserialize<'de> for RawMapFile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FileVisitor;

        impl<'de> Visitor<'de> for FileVisitor {
            type Value = RawMapFile;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of origin blocks and loose transition entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some((label, entry)) = access.next_entry::<String, RawEntry>()? {
                    entries.push((label, entry));
                }
                Ok(RawMapFile { entries })
            }
        }

        deserializer.deserialize_map(FileVisitor)
    }
}

impl<'de> Deserialize<'de> for RawEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = RawEntry;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a transition string or an origin block")
            }

            fn visit_str<E: serde::de::Error>(self, text: &str) -> Result<Self::Value, E> {
                Ok(RawEntry::Loose(text.to_string()))
            }

            fn visit_string<E: serde::de::Error>(self, text: String) -> Result<Self::Value, E> {
                Ok(RawEntry::Loose(text))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut block = RawBlock::default();
                while let Some(key) = access.next_key::<String>()? {
                    match key.as_str() {
                        "wayto" => block.wayto.extend(access.next_value::<RawWayto>()?.0),
                        "title" => block.title = Some(access.next_value()?),
                        "location" => block.location = Some(access.next_value()?),
                        "tags" => block.tags = access.next_value()?,
                        "uid" => block.uids = access.next_value()?,
                        _ => {
                            access.next_value::<IgnoredAny>()?;
                        },
                    }
                }
                Ok(RawEntry::Block(block))
            }
        }

        deserializer.deserialize_any(EntryVisitor)
    }
}

/// A wayto block with duplicate target keys preserved in order.
struct RawWayto(Vec<(String, String)>);

impl<'de> Deserialize<'de> for RawWayto {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WaytoVisitor;

        impl<'de> Visitor<'de> for WaytoVisitor {
            type Value = RawWayto;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of target node ids to transition text")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::new();
                while let Some(pair) = access.next_entry::<String, String>()? {
                    pairs.push(pair);
                }
                Ok(RawWayto(pairs))
            }
        }

        deserializer.deserialize_map(WaytoVisitor)
    }
}
