//! Process-wide cache of presence-check results.

use std::collections::HashMap;
use std::sync::RwLock;

/// Maps canonical numbers to their last-known registration status.
///
/// Entries are never evicted and never expire; staleness over the process
/// lifetime is an accepted tradeoff. Safe to share between in-flight
/// batches; concurrent writes are last-write-wins, which is fine because
/// the values are idempotent.
pub struct PresenceCache {
    entries: RwLock<HashMap<String, bool>>,
}

impl PresenceCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, number: &str) -> Option<bool> {
        self.entries
            .read()
            .expect("presence cache lock poisoned")
            .get(number)
            .copied()
    }

    /// Store a result, overwriting any previous entry unconditionally.
    pub fn put(&self, number: &str, registered: bool) {
        self.entries
            .write()
            .expect("presence cache lock poisoned")
            .insert(number.to_string(), registered);
    }
}

impl Default for PresenceCache {
    fn default() -> Self {
        Self::new()
    }
}
