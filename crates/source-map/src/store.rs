//! Shared store of line maps keyed by output identifier.

use crate::LineMap;
use rustc_hash::FxHashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Holds the latest [`LineMap`] for each rewritten output.
///
/// The store is an ordinary value: callers create one and pass it to every
/// rewrite whose provenance they want to query later. Entries are replaced
/// whole, never merged. Each entry is published only after its map is fully
/// built, so readers never see a partial map; when two rewrites target the
/// same identifier concurrently, the last one to finish wins.
#[derive(Debug, Default)]
pub struct SourceMapStore {
    entries: RwLock<FxHashMap<String, Arc<LineMap>>>,
}

impl SourceMapStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `map` for `output_id`, replacing any previous entry.
    pub fn insert(&self, output_id: impl Into<String>, map: LineMap) {
        self.insert_shared(output_id, Arc::new(map));
    }

    /// Stores an already shared map for `output_id`, replacing any previous entry.
    pub fn insert_shared(&self, output_id: impl Into<String>, map: Arc<LineMap>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(output_id.into(), map);
    }

    /// Returns the map recorded for `output_id`.
    pub fn get(&self, output_id: &str) -> Option<Arc<LineMap>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(output_id)
            .cloned()
    }

    /// Returns the 1-indexed input line for a 1-indexed line of `output_id`.
    ///
    /// Returns `None` when the identifier is unknown or the line is synthesized.
    pub fn lookup(&self, output_id: &str, output_line: u32) -> Option<u32> {
        self.get(output_id)?.line(output_line)
    }

    /// Removes the entry for `output_id`, returning it.
    pub fn remove(&self, output_id: &str) -> Option<Arc<LineMap>> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(output_id)
    }

    /// Returns the identifiers with a recorded map, sorted.
    pub fn output_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Segment;
    use pretty_assertions::assert_eq;

    fn map_to(original_line: u32) -> LineMap {
        LineMap::from_segments(
            &[Segment {
                output_start: 0,
                output_end: 0,
                original_line,
                verbatim: false,
            }],
            1,
        )
    }

    #[test]
    fn test_lookup_unknown_identifier() {
        let store = SourceMapStore::new();
        assert_eq!(store.lookup("missing", 1), None);
    }

    #[test]
    fn test_insert_replaces_previous_entry() {
        let store = SourceMapStore::new();
        store.insert("out.rb", map_to(0));
        store.insert("out.rb", LineMap::new());

        assert_eq!(store.lookup("out.rb", 1), None);
        assert_eq!(store.get("out.rb").map(|map| map.len()), Some(0));
    }

    #[test]
    fn test_entries_are_independent() {
        let store = SourceMapStore::new();
        store.insert("a.rb", map_to(2));
        store.insert("b.rb", map_to(5));

        assert_eq!(store.lookup("a.rb", 1), Some(3));
        assert_eq!(store.lookup("b.rb", 1), Some(6));
        assert_eq!(store.output_ids(), vec!["a.rb", "b.rb"]);

        store.remove("a.rb");
        assert_eq!(store.lookup("a.rb", 1), None);
    }
}
