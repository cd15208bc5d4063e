//! Scan orchestration.
//!
//! Fans the prober out over a set of candidate directories, guaranteeing at
//! most one in-flight probe per directory process-wide. A directory that is
//! not itself a JDK optionally has its immediate subdirectories probed, so a
//! parent directory holding several installs yields them all. Directory-level
//! failures never abort a scan.

use crate::models::JdkRecord;
use crate::probe::JdkProber;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use walkdir::WalkDir;

type ProbeSlot = Arc<OnceLock<Option<JdkRecord>>>;

/// Deduplicates concurrent probes of the same directory: a later request
/// arriving while one is pending blocks on and shares the single outcome.
/// Slots are dropped once the probe finishes, so nothing is cached here.
#[derive(Default)]
struct InflightProbes {
    slots: Mutex<HashMap<PathBuf, ProbeSlot>>,
}

impl InflightProbes {
    fn probe(&self, dir: &Path, prober: &dyn JdkProber) -> Option<JdkRecord> {
        let (slot, owner) = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            match slots.get(dir) {
                Some(existing) => (Arc::clone(existing), false),
                None => {
                    let slot: ProbeSlot = Arc::new(OnceLock::new());
                    slots.insert(dir.to_path_buf(), Arc::clone(&slot));
                    (slot, true)
                }
            }
        };

        // get_or_init blocks joiners until the owning probe completes.
        let result = slot.get_or_init(|| prober.probe(dir)).clone();

        if owner {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(current) = slots.get(dir) {
                if Arc::ptr_eq(current, &slot) {
                    slots.remove(dir);
                }
            }
        }

        result
    }
}

/// Runs probes over candidate directory sets.
pub struct ScanOrchestrator {
    inflight: InflightProbes,
    scan_subdirectories: bool,
}

impl ScanOrchestrator {
    pub fn new(scan_subdirectories: bool) -> Self {
        Self {
            inflight: InflightProbes::default(),
            scan_subdirectories,
        }
    }

    /// Probes every directory concurrently and collects the valid records,
    /// unordered.
    pub fn scan(&self, dirs: &[PathBuf], prober: &dyn JdkProber) -> Vec<JdkRecord> {
        let records = thread::scope(|scope| {
            let handles: Vec<_> = dirs
                .iter()
                .map(|dir| scope.spawn(move || self.scan_dir(dir, prober)))
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap_or_default())
                .collect::<Vec<_>>()
        });

        log::debug!("Scanned {} dirs, found {} JDKs", dirs.len(), records.len());
        records
    }

    /// Probes a single directory, expanding one subdirectory level when the
    /// directory itself is not a JDK.
    pub fn scan_dir(&self, dir: &Path, prober: &dyn JdkProber) -> Vec<JdkRecord> {
        if let Some(record) = self.inflight.probe(dir, prober) {
            return vec![record];
        }

        if !self.scan_subdirectories {
            return Vec::new();
        }

        let subdirs: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir())
            .map(|entry| entry.into_path())
            .collect();

        thread::scope(|scope| {
            let handles: Vec<_> = subdirs
                .iter()
                .map(|sub| scope.spawn(move || self.inflight.probe(sub, prober)))
                .collect();

            handles
                .into_iter()
                .filter_map(|handle| handle.join().unwrap_or_default())
                .collect()
        })
    }
}
