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

//! Detection entry points.
//!
//! `JdkScanner` owns the cache, the scan orchestrator and the prober, and
//! exposes the one-shot `detect`, the live `watch`, and the test-isolation
//! `reset_cache` operations.

use crate::cache::DetectionCache;
use crate::collection::JdkCollection;
use crate::config::ScanConfig;
use crate::discovery;
use crate::error::{JdkScanError, Result};
use crate::models::JdkRecord;
use crate::paths;
use crate::probe::{CommandProber, JdkProber};
use crate::scan::ScanOrchestrator;
use crate::watch::WatchHandle;
use serde::Deserialize;
use std::sync::Arc;

/// Candidate paths as they arrive on the serde surface: a single string or an
/// array of strings. Anything else is an input error, caught before any probe
/// runs.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PathInput {
    One(String),
    Many(Vec<String>),
}

impl Default for PathInput {
    fn default() -> Self {
        PathInput::Many(Vec::new())
    }
}

impl PathInput {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            PathInput::One(path) => vec![path],
            PathInput::Many(paths) => paths,
        }
    }
}

impl From<Vec<String>> for PathInput {
    fn from(paths: Vec<String>) -> Self {
        PathInput::Many(paths)
    }
}

impl From<&str> for PathInput {
    fn from(path: &str) -> Self {
        PathInput::One(path.to_string())
    }
}

/// Per-request detection options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectOptions {
    /// Bypass the cache and re-probe every candidate directory.
    pub force: bool,
    /// Additional candidate directories.
    pub paths: PathInput,
    /// Skip the well-known OS locations, `JAVA_HOME` and `PATH`.
    pub ignore_platform_paths: bool,
    /// Return the live shared collection instead of a detached snapshot.
    pub observable: bool,
}

impl DetectOptions {
    /// Validating constructor for untyped callers (tooling configs, IPC).
    /// Rejects e.g. `{"paths": [123]}` with `InvalidInput`.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| JdkScanError::InvalidInput(format!("Invalid detect options: {e}")))
    }
}

/// What `detect` hands back: the cached live collection or a detached copy.
/// The two forms never alias mutable state.
pub enum DetectOutcome {
    Live(Arc<JdkCollection>),
    Snapshot(Vec<JdkRecord>),
}

impl DetectOutcome {
    /// Record contents regardless of form.
    pub fn records(&self) -> Vec<JdkRecord> {
        match self {
            DetectOutcome::Live(collection) => collection.snapshot(),
            DetectOutcome::Snapshot(records) => records.clone(),
        }
    }
}

pub struct JdkScanner {
    config: ScanConfig,
    cache: Arc<DetectionCache>,
    orchestrator: Arc<ScanOrchestrator>,
    prober: Arc<dyn JdkProber>,
}

impl JdkScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self::with_prober(config, Arc::new(CommandProber))
    }

    /// Injection point for tests and alternative probing strategies.
    pub fn with_prober(config: ScanConfig, prober: Arc<dyn JdkProber>) -> Self {
        let orchestrator = Arc::new(ScanOrchestrator::new(config.scan_subdirectories));
        Self {
            config,
            cache: Arc::new(DetectionCache::new()),
            orchestrator,
            prober,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// One-shot detection. Resolves with a possibly empty collection; rejects
    /// only for invalid input or infrastructure failures, never because zero
    /// JDKs were found.
    pub fn detect(&self, opts: &DetectOptions) -> Result<DetectOutcome> {
        let candidates = discovery::resolve_candidate_paths(opts);
        let normalized = paths::normalize(&candidates)?;

        if !opts.force {
            if let Some(collection) = self.cache.get(&normalized.fingerprint) {
                log::debug!("Cache hit for {}", normalized.fingerprint);
                return Ok(self.outcome(collection, opts.observable));
            }
        }

        let records = self.orchestrator.scan(&normalized.dirs, self.prober.as_ref());
        let collection = self.cache.get_or_create(&normalized.fingerprint);
        collection.merge(records, &discovery::search_path_dirs());

        Ok(self.outcome(collection, opts.observable))
    }

    /// Starts a watch session: initial scan, then targeted rescans driven by
    /// filesystem change notifications, merged into the cached collection.
    pub fn watch(&self, opts: &DetectOptions) -> Result<WatchHandle> {
        let candidates = discovery::resolve_candidate_paths(opts);
        let normalized = paths::normalize(&candidates)?;
        let collection = self.cache.get_or_create(&normalized.fingerprint);

        crate::watch::start_session(
            &self.config,
            opts,
            normalized,
            collection,
            Arc::clone(&self.orchestrator),
            Arc::clone(&self.prober),
        )
    }

    /// Process-wide cache reset, used for test isolation.
    pub fn reset_cache(&self) {
        self.cache.reset();
    }

    fn outcome(&self, collection: Arc<JdkCollection>, observable: bool) -> DetectOutcome {
        if observable {
            DetectOutcome::Live(collection)
        } else {
            DetectOutcome::Snapshot(collection.snapshot())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_from_json() {
        let opts = DetectOptions::from_json(json!({
            "force": true,
            "paths": ["/opt/java", "/usr/lib/jvm"],
            "observable": true,
        }))
        .unwrap();
        assert!(opts.force);
        assert!(opts.observable);
        assert_eq!(opts.paths.into_vec().len(), 2);
    }

    #[test]
    fn test_options_single_path_string() {
        let opts = DetectOptions::from_json(json!({ "paths": "/opt/java" })).unwrap();
        assert_eq!(opts.paths.into_vec(), vec!["/opt/java".to_string()]);
    }

    #[test]
    fn test_options_reject_non_string_path_element() {
        let err = DetectOptions::from_json(json!({ "paths": [123] })).unwrap_err();
        assert!(matches!(err, JdkScanError::InvalidInput(_)));
    }

    #[test]
    fn test_options_reject_non_string_paths_value() {
        let err = DetectOptions::from_json(json!({ "paths": 7 })).unwrap_err();
        assert!(matches!(err, JdkScanError::InvalidInput(_)));
    }

    #[test]
    fn test_options_reject_unknown_field() {
        let err = DetectOptions::from_json(json!({ "fore": true })).unwrap_err();
        assert!(matches!(err, JdkScanError::InvalidInput(_)));
    }
}
