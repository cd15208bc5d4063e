//! Watch sessions.
//!
//! A session resolves its candidate directories once, runs a baseline scan,
//! then keeps the cached collection current: one non-recursive filesystem
//! watch per resolved directory, a per-directory debounce deadline coalescing
//! event bursts, and a rescan restricted to the affected directory merged
//! scoped into the collection. Candidate sources without native change
//! events (the Windows registry) are re-resolved on a fixed polling interval
//! instead.

use crate::collection::JdkCollection;
use crate::config::ScanConfig;
use crate::discovery;
use crate::error::{JdkScanError, Result};
use crate::models::JdkRecord;
use crate::paths::NormalizedPaths;
use crate::probe::JdkProber;
use crate::scan::ScanOrchestrator;
use crate::scanner::DetectOptions;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const IDLE_WAIT: Duration = Duration::from_secs(3600);

type ResultsCallback = Arc<dyn Fn(&[JdkRecord]) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&JdkScanError) + Send + Sync>;

enum SessionMessage {
    Fs(notify::Result<notify::Event>),
    Stop,
}

struct SessionShared {
    stopped: AtomicBool,
    watcher: Mutex<Option<RecommendedWatcher>>,
    results_subs: Mutex<Vec<ResultsCallback>>,
    error_subs: Mutex<Vec<ErrorCallback>>,
    collection: Arc<JdkCollection>,
}

impl SessionShared {
    fn emit_results(&self) {
        let snapshot = self.collection.snapshot();
        let subs: Vec<ResultsCallback> = self
            .results_subs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for callback in subs {
            callback(&snapshot);
        }
    }

    fn fail(&self, error: &JdkScanError) {
        log::warn!("Watch session failed: {error}");
        self.stopped.store(true, Ordering::SeqCst);
        // Releases every native watch handle.
        self.watcher.lock().unwrap_or_else(|e| e.into_inner()).take();
        let subs: Vec<ErrorCallback> = self
            .error_subs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for callback in subs {
            callback(error);
        }
    }
}

/// Handle to a running watch session.
pub struct WatchHandle {
    shared: Arc<SessionShared>,
    sender: Sender<SessionMessage>,
}

impl WatchHandle {
    /// Registers a callback invoked with the full, up-to-date record list
    /// after every successful merge.
    pub fn on_results(&self, callback: impl Fn(&[JdkRecord]) + Send + Sync + 'static) {
        self.shared
            .results_subs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::new(callback));
    }

    /// Registers a callback invoked when the session fails and stops.
    pub fn on_error(&self, callback: impl Fn(&JdkScanError) + Send + Sync + 'static) {
        self.shared
            .error_subs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::new(callback));
    }

    /// The live collection this session keeps current.
    pub fn collection(&self) -> Arc<JdkCollection> {
        Arc::clone(&self.shared.collection)
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    /// Releases all watches and pending debounce deadlines. Idempotent. An
    /// already-dispatched probe is not cancelled; its result is discarded.
    pub fn stop(&self) {
        if self.shared.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.sender.send(SessionMessage::Stop);
        self.shared
            .watcher
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        log::debug!("Watch session stopped");
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Resolves, scans and transitions the session to Active.
pub fn start_session(
    config: &ScanConfig,
    opts: &DetectOptions,
    normalized: NormalizedPaths,
    collection: Arc<JdkCollection>,
    orchestrator: Arc<ScanOrchestrator>,
    prober: Arc<dyn JdkProber>,
) -> Result<WatchHandle> {
    // Baseline scan before any watch attaches.
    let records = orchestrator.scan(&normalized.dirs, prober.as_ref());
    collection.merge(records, &discovery::search_path_dirs());

    let (sender, receiver) = mpsc::channel();
    let event_sender = sender.clone();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = event_sender.send(SessionMessage::Fs(res));
        },
        notify::Config::default(),
    )
    .map_err(|e| JdkScanError::WatchSetup(e.to_string()))?;

    let mut watched: Vec<PathBuf> = Vec::new();
    for dir in &normalized.dirs {
        if !dir.is_dir() {
            // Literal candidate that may appear later; polling re-resolution
            // is the only way it gets picked up.
            log::debug!("Not watching non-existent candidate {}", dir.display());
            continue;
        }
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                JdkScanError::WatchSetup(format!("cannot watch {}: {e}", dir.display()))
            })?;
        watched.push(dir.clone());
    }
    log::info!("Watching {} directories", watched.len());

    let shared = Arc::new(SessionShared {
        stopped: AtomicBool::new(false),
        watcher: Mutex::new(Some(watcher)),
        results_subs: Mutex::new(Vec::new()),
        error_subs: Mutex::new(Vec::new()),
        collection,
    });

    let poll_interval = (discovery::requires_polling() && !opts.ignore_platform_paths)
        .then(|| config.registry_poll_interval());

    let coordinator = Coordinator {
        shared: Arc::clone(&shared),
        orchestrator,
        prober,
        opts: opts.clone(),
        debounce: config.debounce(),
        poll_interval,
        watched,
    };
    thread::Builder::new()
        .name("jdkscan-watch".to_string())
        .spawn(move || coordinator.run(receiver))
        .map_err(|e| JdkScanError::WatchSetup(e.to_string()))?;

    Ok(WatchHandle { shared, sender })
}

struct Coordinator {
    shared: Arc<SessionShared>,
    orchestrator: Arc<ScanOrchestrator>,
    prober: Arc<dyn JdkProber>,
    opts: DetectOptions,
    debounce: Duration,
    poll_interval: Option<Duration>,
    watched: Vec<PathBuf>,
}

impl Coordinator {
    fn run(mut self, receiver: Receiver<SessionMessage>) {
        // One pending single-shot deadline per directory; a new event for the
        // same directory re-arms it, so a burst dispatches exactly one rescan.
        let mut deadlines: HashMap<PathBuf, Instant> = HashMap::new();
        let mut next_poll = self.poll_interval.map(|interval| Instant::now() + interval);

        loop {
            if self.shared.stopped.load(Ordering::SeqCst) {
                return;
            }

            let wait = next_wakeup(&deadlines, next_poll)
                .map(|at| at.saturating_duration_since(Instant::now()))
                .unwrap_or(IDLE_WAIT);

            match receiver.recv_timeout(wait) {
                Ok(SessionMessage::Fs(Ok(event))) => {
                    for path in &event.paths {
                        if let Some(dir) = self.owning_dir(path) {
                            deadlines.insert(dir, Instant::now() + self.debounce);
                        }
                    }
                }
                Ok(SessionMessage::Fs(Err(err))) => {
                    self.shared
                        .fail(&JdkScanError::WatchSession(err.to_string()));
                    return;
                }
                Ok(SessionMessage::Stop) | Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => {}
            }

            let now = Instant::now();
            let due: Vec<PathBuf> = deadlines
                .iter()
                .filter(|(_, at)| **at <= now)
                .map(|(dir, _)| dir.clone())
                .collect();
            for dir in due {
                deadlines.remove(&dir);
                self.rescan(&dir);
                if self.shared.stopped.load(Ordering::SeqCst) {
                    return;
                }
            }

            if let Some(at) = next_poll {
                if at <= Instant::now() {
                    self.repoll_candidates();
                    next_poll = self
                        .poll_interval
                        .map(|interval| Instant::now() + interval);
                }
            }
        }
    }

    /// Rescans one directory and merges the outcome, scoped to it.
    fn rescan(&self, dir: &Path) {
        log::debug!("Rescanning {}", dir.display());
        let records = self.orchestrator.scan_dir(dir, self.prober.as_ref());
        if self.shared.stopped.load(Ordering::SeqCst) {
            // The probe was already in flight when the session stopped.
            return;
        }
        self.shared
            .collection
            .merge_scoped(dir, records, &discovery::search_path_dirs());
        self.shared.emit_results();
    }

    /// Periodic re-resolution for candidate sources without native change
    /// events. New top-level directories get a watch and an initial merge.
    fn repoll_candidates(&mut self) {
        let candidates = discovery::resolve_candidate_paths(&self.opts);
        let Ok(normalized) = crate::paths::normalize(&candidates) else {
            return;
        };

        for dir in normalized.dirs {
            if self.watched.contains(&dir) || !dir.is_dir() {
                continue;
            }

            let mut watcher_slot = self
                .shared
                .watcher
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            let Some(watcher) = watcher_slot.as_mut() else {
                return; // session already stopped
            };
            if let Err(err) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
                log::warn!("Failed to watch re-resolved {}: {err}", dir.display());
                continue;
            }
            drop(watcher_slot);

            log::info!("Watching re-resolved candidate {}", dir.display());
            self.watched.push(dir.clone());
            self.rescan(&dir);
        }
    }

    /// Longest watched prefix owning an event path.
    fn owning_dir(&self, path: &Path) -> Option<PathBuf> {
        self.watched
            .iter()
            .filter(|dir| path.starts_with(dir))
            .max_by_key(|dir| dir.components().count())
            .cloned()
    }
}

fn next_wakeup(deadlines: &HashMap<PathBuf, Instant>, next_poll: Option<Instant>) -> Option<Instant> {
    let earliest_debounce = deadlines.values().min().copied();
    match (earliest_debounce, next_poll) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
