//! Structural extraction over the upstream wire shape.
//!
//! Yahoo responses wrap every collection in an *indexed container* and most
//! entities in a *two-part encoding*:
//!
//! ```text
//! "players": {                         "player": [
//!   "count": 2,                           [ {"player_key": "428.p.6014"},   <- head
//!   "0": { "player": [...] },               {"player_id": "6014"},
//!   "1": { "player": [...] }                {"name": {...}} ],
//! }                                       { "player_stats": {...} }         <- tail
//!                                       ]
//! ```
//!
//! Attribute groups arrive either as a mapping or as a list of single-key
//! mappings. [`Grouping`] names both shapes and [`resolve_grouping`] turns
//! either into one map. Nothing in this module panics on absent keys or
//! type mismatches; lookups return `None` or an empty collection.

pub mod coerce;

use serde_json::{Map, Value};

pub use coerce::{Coerced, FieldReader};

// =============================================================================
// Grouping
// =============================================================================

/// The two shapes an attribute group can take.
#[derive(Debug, Clone, Copy)]
pub enum Grouping<'a> {
    Mapping(&'a Map<String, Value>),
    /// A list whose object elements are merged; nested lists are flattened.
    MergeableSequence(&'a [Value]),
}

impl<'a> Grouping<'a> {
    /// Classify a node. Scalars and null are not groupings.
    pub fn of(node: &'a Value) -> Option<Self> {
        match node {
            Value::Object(map) => Some(Grouping::Mapping(map)),
            Value::Array(items) => Some(Grouping::MergeableSequence(items)),
            _ => None,
        }
    }

    /// Merge into a single map. The first occurrence of a key wins.
    pub fn resolve(&self) -> Map<String, Value> {
        let mut out = Map::new();
        self.merge_into(&mut out);
        out
    }

    fn merge_into(&self, out: &mut Map<String, Value>) {
        match self {
            Grouping::Mapping(map) => {
                for (k, v) in map.iter() {
                    if !out.contains_key(k) {
                        out.insert(k.clone(), v.clone());
                    }
                }
            }
            Grouping::MergeableSequence(items) => {
                for item in items.iter() {
                    if let Some(inner) = Grouping::of(item) {
                        inner.merge_into(out);
                    }
                }
            }
        }
    }
}

/// Resolve a mapping-or-sequence node into a map (empty for anything else).
pub fn resolve_grouping(node: &Value) -> Map<String, Value> {
    Grouping::of(node).map(|g| g.resolve()).unwrap_or_default()
}

// =============================================================================
// Path access
// =============================================================================

/// Walk `path` through objects (by key) and arrays (by numeric segment).
pub fn get_path<'a>(node: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = node;
    for segment in path {
        current = match current {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Like [`get_path`] but falls back to `default`.
pub fn get_path_or<'a>(node: &'a Value, path: &[&str], default: &'a Value) -> &'a Value {
    get_path(node, path).unwrap_or(default)
}

/// Depth-first search for the first value stored under `key`.
pub fn find_key<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => {
            if let Some(found) = map.get(key) {
                return Some(found);
            }
            map.values().find_map(|v| find_key(v, key))
        }
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}

/// Strip a single wrapper key: `{"player": X}` becomes `X`.
pub fn unwrap_entity<'a>(node: &'a Value, key: &str) -> &'a Value {
    match node {
        Value::Object(map) => map.get(key).unwrap_or(node),
        _ => node,
    }
}

// =============================================================================
// Indexed containers
// =============================================================================

/// Read the `count` of an indexed container. Absent or garbage means zero.
pub fn container_count(container: &Value) -> usize {
    match container.get("count") {
        Some(Value::Number(n)) => n.as_u64().map(|c| usize::try_from(c).unwrap_or(usize::MAX)).unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<usize>().unwrap_or(0),
        _ => 0,
    }
}

/// Entries `"0"..count-1` of an indexed container, in index order.
///
/// Only keys actually present are walked, so the cost is bounded by the
/// container size whatever `count` claims. Missing indices are skipped. A
/// plain JSON array is accepted as the same collection.
pub fn indexed_entries(container: &Value) -> Vec<&Value> {
    match container {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            let count = container_count(container);
            let mut entries: Vec<(usize, &Value)> = map
                .iter()
                .filter_map(|(k, v)| index_of(k).filter(|i| *i < count).map(|i| (i, v)))
                .collect();
            entries.sort_unstable_by_key(|(i, _)| *i);
            entries.into_iter().map(|(_, v)| v).collect()
        }
        _ => Vec::new(),
    }
}

/// Canonical decimal index keys only: `"0"`, `"12"`, not `"01"` or `"+1"`.
fn index_of(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse().ok()
}

/// `(declared, present)` when an object container's `count` disagrees with
/// the index entries it actually holds.
pub fn count_mismatch(container: &Value) -> Option<(usize, usize)> {
    let map = container.as_object()?;
    let declared = container_count(container);
    let present = map.keys().filter(|k| index_of(k).is_some()).count();
    (declared != present).then_some((declared, present))
}

/// Entities of an indexed container, each unwrapped from `item_key`.
///
/// Entries that do not carry `item_key` are skipped for object containers;
/// array elements without the wrapper are taken as-is.
pub fn indexed_items<'a>(container: &'a Value, item_key: &str) -> Vec<&'a Value> {
    match container {
        Value::Array(items) => items.iter().map(|v| unwrap_entity(v, item_key)).collect(),
        Value::Object(_) => indexed_entries(container)
            .into_iter()
            .filter_map(|entry| entry.get(item_key))
            .collect(),
        _ => Vec::new(),
    }
}

// =============================================================================
// Two-part entities
// =============================================================================

/// An entity split into its identity head and named sub-object tail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityParts {
    pub head: Map<String, Value>,
    pub tail: Map<String, Value>,
}

impl EntityParts {
    /// Look up a key in the head first, then in the tail.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.head.get(key).or_else(|| self.tail.get(key))
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_empty() && self.tail.is_empty()
    }
}

/// Split a (possibly two-part) entity into head and tail.
///
/// - `[head, tail, more...]`: element 0 resolves to the head, all later
///   elements are merged into the tail (standings carry three parts).
/// - a plain object is all head.
/// - anything else yields empty parts.
pub fn split_head_tail(entity: &Value) -> EntityParts {
    match entity {
        Value::Array(items) => {
            let head = items.first().map(resolve_grouping).unwrap_or_default();
            let mut tail = Map::new();
            for item in items.iter().skip(1) {
                for (k, v) in resolve_grouping(item) {
                    tail.entry(k).or_insert(v);
                }
            }
            EntityParts { head, tail }
        }
        Value::Object(map) => EntityParts { head: map.clone(), tail: Map::new() },
        _ => EntityParts::default(),
    }
}
