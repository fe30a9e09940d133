/// In-place clearing of caller-owned maps.
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Remove every entry from `map`, keeping its allocation.
pub fn clear_map<K, V, S: BuildHasher>(map: &mut HashMap<K, V, S>) {
    let removed = map.len();
    map.clear();
    tracing::trace!(removed, "cleared map");
}

/// Remove every entry from an ordered map.
pub fn clear_btree_map<K, V>(map: &mut BTreeMap<K, V>) {
    map.clear();
}
