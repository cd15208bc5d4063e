//! Process-wide detection cache.
//!
//! Maps a path-set fingerprint to its living collection. Entries are updated
//! in place, never replaced, so references handed to callers stay valid.
//! There is no eviction; the number of distinct path sets a process requests
//! is expected to be small.

use crate::collection::JdkCollection;
use crate::paths::Fingerprint;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct DetectionCache {
    entries: Mutex<HashMap<Fingerprint, Arc<JdkCollection>>>,
}

impl DetectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<JdkCollection>> {
        self.lock_entries().get(fingerprint).cloned()
    }

    /// Returns the existing entry or inserts an empty collection, so a living
    /// merge target exists before watchers attach to it.
    pub fn get_or_create(&self, fingerprint: &Fingerprint) -> Arc<JdkCollection> {
        let mut entries = self.lock_entries();
        Arc::clone(
            entries
                .entry(fingerprint.clone())
                .or_insert_with(|| Arc::new(JdkCollection::new())),
        )
    }

    /// Clears all entries. Test isolation / explicit lifecycle reset only.
    pub fn reset(&self) {
        let mut entries = self.lock_entries();
        let dropped = entries.len();
        entries.clear();
        log::debug!("Detection cache reset, dropped {dropped} entries");
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    fn lock_entries(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<Fingerprint, Arc<JdkCollection>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
