//! Last-known health per entity key.

use super::types::{HealthSnapshot, HealthState, RawHealthMap};
use std::collections::HashMap;

/// Merge-by-key cache of health snapshots.
///
/// A key missing from a fresh map keeps its previous snapshot; a key never
/// seen reads as `Unknown`.
#[derive(Debug, Default)]
pub struct StatusStore {
    snapshots: HashMap<String, HealthSnapshot>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a freshly polled health map into the cache
    pub fn merge(&mut self, health: &RawHealthMap) {
        for (key, raw) in health {
            self.snapshots.insert(key.clone(), HealthSnapshot::from(raw));
        }
    }

    pub fn get(&self, key: &str) -> HealthSnapshot {
        self.snapshots.get(key).copied().unwrap_or_default()
    }

    pub fn state(&self, key: &str) -> HealthState {
        self.get(key).state
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::RawHealth;

    fn health(entries: &[(&str, bool)]) -> RawHealthMap {
        entries
            .iter()
            .map(|(k, ok)| (k.to_string(), RawHealth { ok: *ok, ..Default::default() }))
            .collect()
    }

    #[test]
    fn missing_key_is_unknown() {
        let store = StatusStore::new();
        assert_eq!(store.state("nope"), HealthState::Unknown);
        assert_eq!(store.get("nope").latency_ms, None);
    }

    #[test]
    fn merge_overwrites_and_keeps_absent_keys() {
        let mut store = StatusStore::new();
        store.merge(&health(&[("a", true), ("b", true)]));
        store.merge(&health(&[("a", false)]));
        assert_eq!(store.state("a"), HealthState::Down);
        assert_eq!(store.state("b"), HealthState::Up);
        assert_eq!(store.len(), 2);
    }
}
