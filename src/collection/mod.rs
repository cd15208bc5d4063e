// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Observable result collection.
//!
//! Ordered container of detected JDK records supporting sort, default
//! selection and diff-based in-place merges. Record-level subscriptions are
//! keyed by the `(version, build)` identity key, so a subscriber bound to
//! "JDK 1.8.0 build 92" keeps receiving updates after a rescan replaces the
//! underlying record object.

use crate::models::{JdkRecord, RecordKey};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

pub type SubscriptionId = u64;

type CollectionCallback = Arc<dyn Fn(&CollectionChange) + Send + Sync>;
type RecordCallback = Arc<dyn Fn(&RecordEvent) + Send + Sync>;

/// Payload of one collection-level `changed` notification.
#[derive(Debug, Clone)]
pub struct CollectionChange {
    /// Full contents after the merge, in sorted order.
    pub records: Vec<JdkRecord>,
    pub added: Vec<RecordKey>,
    pub removed: Vec<RecordKey>,
    pub updated: Vec<RecordKey>,
}

/// Event delivered to a record-level subscriber.
#[derive(Debug, Clone)]
pub enum RecordEvent {
    /// The record was replaced by an updated instance (different path,
    /// architecture or default flag).
    Updated(JdkRecord),
    /// The installation disappeared from the result set.
    Removed,
}

struct CollectionState {
    records: Vec<JdkRecord>,
    collection_subs: Vec<(SubscriptionId, CollectionCallback)>,
    record_subs: HashMap<RecordKey, Vec<(SubscriptionId, RecordCallback)>>,
}

/// Shared, internally synchronized collection of detected JDKs.
///
/// Merges are serialized per collection; subscribers are invoked outside the
/// state lock so a callback may freely call back into the collection.
pub struct JdkCollection {
    state: Mutex<CollectionState>,
    merge_gate: Mutex<()>,
    next_subscription: AtomicU64,
}

impl Default for JdkCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl JdkCollection {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CollectionState {
                records: Vec::new(),
                collection_subs: Vec::new(),
                record_subs: HashMap::new(),
            }),
            merge_gate: Mutex::new(()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Detached copy of the current contents; never aliases live state.
    pub fn snapshot(&self) -> Vec<JdkRecord> {
        self.lock_state().records.clone()
    }

    pub fn len(&self) -> usize {
        self.lock_state().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_state().records.is_empty()
    }

    /// The record currently marked default, if any.
    pub fn default_record(&self) -> Option<JdkRecord> {
        self.lock_state()
            .records
            .iter()
            .find(|r| r.is_default)
            .cloned()
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&CollectionChange) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, AtomicOrdering::SeqCst);
        self.lock_state()
            .collection_subs
            .push((id, Arc::new(callback)));
        id
    }

    /// Binds a callback to the installation identified by `key`. The binding
    /// survives rescans that replace the record object.
    pub fn subscribe_record(
        &self,
        key: RecordKey,
        callback: impl Fn(&RecordEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, AtomicOrdering::SeqCst);
        self.lock_state()
            .record_subs
            .entry(key)
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut state = self.lock_state();
        state.collection_subs.retain(|(sub_id, _)| *sub_id != id);
        for subs in state.record_subs.values_mut() {
            subs.retain(|(sub_id, _)| *sub_id != id);
        }
        state.record_subs.retain(|_, subs| !subs.is_empty());
    }

    /// Replaces the full contents with `incoming` (a raw, unsorted scan
    /// result), applying sort, default selection, dedup and diffing, then
    /// fires one `changed` notification.
    pub fn merge(&self, incoming: Vec<JdkRecord>, search_dirs: &HashSet<PathBuf>) {
        self.merge_internal(incoming, search_dirs, None)
    }

    /// Scoped variant for watch rescans of a single directory: only records
    /// whose path falls under `scope` are replaced; the rest carry over.
    pub fn merge_scoped(
        &self,
        scope: &Path,
        incoming: Vec<JdkRecord>,
        search_dirs: &HashSet<PathBuf>,
    ) {
        self.merge_internal(incoming, search_dirs, Some(scope))
    }

    fn merge_internal(
        &self,
        incoming: Vec<JdkRecord>,
        search_dirs: &HashSet<PathBuf>,
        scope: Option<&Path>,
    ) {
        // One merge at a time per collection, held across the swap and the
        // notifications so observers never see interleaved partial updates.
        let _gate = self.merge_gate.lock().unwrap_or_else(|e| e.into_inner());

        let (change, collection_events, record_events) = {
            let mut state = self.lock_state();

            let mut next: Vec<JdkRecord> = match scope {
                Some(scope) => state
                    .records
                    .iter()
                    .filter(|r| !r.path.starts_with(scope))
                    .cloned()
                    .chain(incoming)
                    .collect(),
                None => incoming,
            };

            dedup_records(&mut next);
            next.sort_by(compare_records);
            select_default(&mut next, search_dirs);

            let previous_by_key: HashMap<RecordKey, JdkRecord> = state
                .records
                .iter()
                .map(|r| (r.key(), r.clone()))
                .collect();
            let next_keys: HashSet<RecordKey> = next.iter().map(|r| r.key()).collect();

            let mut added = Vec::new();
            let mut updated = Vec::new();
            for record in &next {
                match previous_by_key.get(&record.key()) {
                    None => added.push(record.key()),
                    Some(old) if old != record => updated.push(record.key()),
                    Some(_) => {}
                }
            }
            let removed: Vec<RecordKey> = previous_by_key
                .keys()
                .filter(|key| !next_keys.contains(key))
                .cloned()
                .collect();

            // Atomic all-or-nothing swap.
            state.records = next.clone();

            let change = CollectionChange {
                records: next.clone(),
                added,
                removed: removed.clone(),
                updated: updated.clone(),
            };

            let mut record_events: Vec<(RecordCallback, RecordEvent)> = Vec::new();
            for key in &updated {
                let Some(subs) = state.record_subs.get(key) else {
                    continue;
                };
                if let Some(record) = next.iter().find(|r| &r.key() == key) {
                    for (_, callback) in subs {
                        record_events
                            .push((Arc::clone(callback), RecordEvent::Updated(record.clone())));
                    }
                }
            }
            for key in &removed {
                if let Some(subs) = state.record_subs.get(key) {
                    for (_, callback) in subs {
                        record_events.push((Arc::clone(callback), RecordEvent::Removed));
                    }
                }
            }

            let collection_events: Vec<CollectionCallback> = state
                .collection_subs
                .iter()
                .map(|(_, cb)| Arc::clone(cb))
                .collect();

            (change, collection_events, record_events)
        };

        for callback in collection_events {
            callback(&change);
        }
        for (callback, event) in record_events {
            callback(&event);
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, CollectionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Version ascending, then build ascending, then architecture lexical.
pub fn compare_records(a: &JdkRecord, b: &JdkRecord) -> Ordering {
    a.version
        .cmp(&b.version)
        .then(a.build.cmp(&b.build))
        .then(arch_label(a).cmp(arch_label(b)))
        // Stabilizer for records missing all identity metadata.
        .then_with(|| a.path.cmp(&b.path))
}

fn arch_label(record: &JdkRecord) -> &'static str {
    match record.architecture {
        Some(arch) => match arch {
            crate::models::Architecture::Bit32 => "32bit",
            crate::models::Architecture::Bit64 => "64bit",
        },
        None => "",
    }
}

/// Drops later duplicates of the `(version, build, architecture)` triple.
fn dedup_records(records: &mut Vec<JdkRecord>) {
    let mut seen = HashSet::new();
    records.retain(|record| seen.insert(record.dedup_key()));
}

/// Marks default the first sorted record whose `javac` lives in a search-path
/// directory; falls back to the last record (highest version). `records` must
/// already be sorted.
fn select_default(records: &mut [JdkRecord], search_dirs: &HashSet<PathBuf>) {
    for record in records.iter_mut() {
        record.is_default = false;
    }

    let from_path = records.iter().position(|record| {
        record
            .executables
            .javac
            .parent()
            .map(|bin| search_dirs.contains(&crate::paths::resolve_existing(bin)))
            .unwrap_or(false)
    });

    let chosen = from_path.or_else(|| records.len().checked_sub(1));
    if let Some(index) = chosen {
        records[index].is_default = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Architecture, JdkExecutables};
    use crate::version::Version;
    use std::str::FromStr;
    use std::sync::atomic::AtomicUsize;

    fn record(version: &str, build: u32, path: &str) -> JdkRecord {
        record_with_arch(version, build, path, Architecture::Bit64)
    }

    fn record_with_arch(version: &str, build: u32, path: &str, arch: Architecture) -> JdkRecord {
        let bin = PathBuf::from(path).join("bin");
        JdkRecord {
            path: PathBuf::from(path),
            version: Some(Version::from_str(version).unwrap()),
            build: Some(build),
            architecture: Some(arch),
            executables: JdkExecutables {
                java: bin.join("java"),
                javac: bin.join("javac"),
                keytool: bin.join("keytool"),
                jarsigner: bin.join("jarsigner"),
            },
            is_default: false,
        }
    }

    fn no_search_dirs() -> HashSet<PathBuf> {
        HashSet::new()
    }

    #[test]
    fn test_sort_order() {
        let collection = JdkCollection::new();
        collection.merge(
            vec![
                record("1.8.0", 92, "/opt/jdk8"),
                record("1.6.0", 45, "/opt/jdk6"),
                record_with_arch("1.7.0", 80, "/opt/jdk7-32", Architecture::Bit32),
                record("1.7.0", 80, "/opt/jdk7"),
                record("1.7.0", 75, "/opt/jdk7-old"),
            ],
            &no_search_dirs(),
        );

        let paths: Vec<PathBuf> = collection.snapshot().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/opt/jdk6"),
                PathBuf::from("/opt/jdk7-old"),
                PathBuf::from("/opt/jdk7-32"),
                PathBuf::from("/opt/jdk7"),
                PathBuf::from("/opt/jdk8"),
            ]
        );
    }

    #[test]
    fn test_dedup_triple() {
        let collection = JdkCollection::new();
        collection.merge(
            vec![
                record("1.8.0", 92, "/opt/jdk8"),
                record("1.8.0", 92, "/usr/lib/jvm/jdk8"),
            ],
            &no_search_dirs(),
        );
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_default_fallback_is_highest_version() {
        let collection = JdkCollection::new();
        collection.merge(
            vec![
                record("1.6.0", 45, "/opt/jdk6"),
                record("1.8.0", 92, "/opt/jdk8"),
                record("1.7.0", 80, "/opt/jdk7"),
            ],
            &no_search_dirs(),
        );

        let default = collection.default_record().unwrap();
        assert_eq!(default.path, PathBuf::from("/opt/jdk8"));
        assert_eq!(
            collection.snapshot().iter().filter(|r| r.is_default).count(),
            1
        );
    }

    #[test]
    fn test_default_from_search_path_wins_over_fallback() {
        let collection = JdkCollection::new();
        let search_dirs = HashSet::from([PathBuf::from("/opt/jdk7/bin")]);
        collection.merge(
            vec![
                record("1.6.0", 45, "/opt/jdk6"),
                record("1.7.0", 80, "/opt/jdk7"),
                record("1.8.0", 92, "/opt/jdk8"),
            ],
            &search_dirs,
        );

        let default = collection.default_record().unwrap();
        assert_eq!(default.path, PathBuf::from("/opt/jdk7"));
    }

    #[test]
    fn test_default_moves_when_search_path_entry_removed() {
        let collection = JdkCollection::new();
        let records = vec![
            record("1.6.0", 45, "/opt/jdk6"),
            record("1.7.0", 80, "/opt/jdk7"),
            record("1.8.0", 92, "/opt/jdk8"),
        ];

        let search_dirs = HashSet::from([PathBuf::from("/opt/jdk8/bin")]);
        collection.merge(records.clone(), &search_dirs);
        assert_eq!(
            collection.default_record().unwrap().path,
            PathBuf::from("/opt/jdk8")
        );

        collection.merge(records, &no_search_dirs());
        assert_eq!(
            collection.default_record().unwrap().path,
            PathBuf::from("/opt/jdk8"),
            "fallback picks the highest version"
        );
    }

    #[test]
    fn test_empty_merge_leaves_no_default() {
        let collection = JdkCollection::new();
        collection.merge(vec![record("1.8.0", 92, "/opt/jdk8")], &no_search_dirs());
        collection.merge(Vec::new(), &no_search_dirs());
        assert!(collection.is_empty());
        assert!(collection.default_record().is_none());
    }

    #[test]
    fn test_change_notification_diff() {
        let collection = JdkCollection::new();
        collection.merge(
            vec![
                record("1.6.0", 45, "/opt/jdk6"),
                record("1.8.0", 92, "/opt/jdk8"),
            ],
            &no_search_dirs(),
        );

        let seen: Arc<Mutex<Vec<CollectionChange>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        collection.subscribe(move |change| sink.lock().unwrap().push(change.clone()));

        // jdk6 disappears, jdk7 appears, jdk8 stays put.
        collection.merge(
            vec![
                record("1.7.0", 80, "/opt/jdk7"),
                record("1.8.0", 92, "/opt/jdk8"),
            ],
            &no_search_dirs(),
        );

        let changes = seen.lock().unwrap();
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.records.len(), 2);
        assert_eq!(
            change.added,
            vec![record("1.7.0", 80, "/opt/jdk7").key()]
        );
        assert_eq!(
            change.removed,
            vec![record("1.6.0", 45, "/opt/jdk6").key()]
        );
        assert!(change.updated.is_empty());
    }

    #[test]
    fn test_record_subscription_survives_rescan() {
        let collection = JdkCollection::new();
        collection.merge(vec![record("1.8.0", 92, "/opt/jdk8")], &no_search_dirs());

        let events: Arc<Mutex<Vec<RecordEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        collection.subscribe_record(record("1.8.0", 92, "/opt/jdk8").key(), move |event| {
            sink.lock().unwrap().push(event.clone())
        });

        // Unrelated addition: the binding stays silent but alive.
        collection.merge(
            vec![
                record("1.7.0", 80, "/opt/jdk7"),
                record("1.8.0", 92, "/opt/jdk8"),
            ],
            &no_search_dirs(),
        );
        assert!(events.lock().unwrap().is_empty());

        // Same installation resolved at a new path: the replacement instance
        // reaches the original subscriber.
        collection.merge(
            vec![
                record("1.7.0", 80, "/opt/jdk7"),
                record("1.8.0", 92, "/usr/lib/jvm/jdk8"),
            ],
            &no_search_dirs(),
        );
        {
            let seen = events.lock().unwrap();
            assert_eq!(seen.len(), 1);
            match &seen[0] {
                RecordEvent::Updated(updated) => {
                    assert_eq!(updated.path, PathBuf::from("/usr/lib/jvm/jdk8"));
                }
                RecordEvent::Removed => panic!("expected update"),
            }
        }

        // Removal reaches it too.
        collection.merge(vec![record("1.7.0", 80, "/opt/jdk7")], &no_search_dirs());
        let seen = events.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[1], RecordEvent::Removed));
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let collection = JdkCollection::new();
        let count = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&count);
        let id = collection.subscribe(move |_| {
            sink.fetch_add(1, AtomicOrdering::SeqCst);
        });

        collection.merge(vec![record("1.8.0", 92, "/opt/jdk8")], &no_search_dirs());
        collection.unsubscribe(id);
        collection.merge(Vec::new(), &no_search_dirs());

        assert_eq!(count.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn test_scoped_merge_leaves_other_directories_untouched() {
        let collection = JdkCollection::new();
        collection.merge(
            vec![
                record("1.8.0", 92, "/watched/a/jdk8"),
                record("1.7.0", 80, "/watched/b/jdk7"),
            ],
            &no_search_dirs(),
        );

        // Directory b rescanned empty: only b's record goes away.
        collection.merge_scoped(Path::new("/watched/b"), Vec::new(), &no_search_dirs());
        let paths: Vec<PathBuf> = collection.snapshot().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec![PathBuf::from("/watched/a/jdk8")]);

        // And a JDK copied into b joins the carried-over record.
        collection.merge_scoped(
            Path::new("/watched/b"),
            vec![record("1.6.0", 45, "/watched/b/jdk6")],
            &no_search_dirs(),
        );
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_callback_may_reenter_collection() {
        let collection = Arc::new(JdkCollection::new());
        let inner = Arc::clone(&collection);
        let observed = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&observed);
        collection.subscribe(move |_| {
            sink.store(inner.snapshot().len(), AtomicOrdering::SeqCst);
        });

        collection.merge(vec![record("1.8.0", 92, "/opt/jdk8")], &no_search_dirs());
        assert_eq!(observed.load(AtomicOrdering::SeqCst), 1);
    }
}
