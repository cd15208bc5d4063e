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

//! Candidate path set normalization.
//!
//! Turns a heterogeneous list of candidate directory strings into a
//! deterministic, deduplicated sequence plus a stable fingerprint used as the
//! cache key. Equivalent path sets supplied in different input order produce
//! the same fingerprint.

use crate::error::Result;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// SHA-256 over the canonical JSON encoding of the ordered path set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonicalized candidate set and its cache key.
#[derive(Debug, Clone)]
pub struct NormalizedPaths {
    pub dirs: Vec<PathBuf>,
    pub fingerprint: Fingerprint,
}

/// Normalizes candidate directories: drops empty entries, expands `~` and
/// environment variables, resolves symlinks for paths that currently exist,
/// deduplicates and orders deterministically.
///
/// Non-existent paths are retained as literal candidates; they may appear
/// later and must keep their place in the fingerprint.
pub fn normalize(candidates: &[String]) -> Result<NormalizedPaths> {
    let mut dirs = BTreeSet::new();

    for raw in candidates {
        if raw.is_empty() {
            continue;
        }
        let expanded = expand(raw);
        if expanded.is_empty() {
            continue;
        }
        dirs.insert(resolve_existing(Path::new(&expanded)));
    }

    let dirs: Vec<PathBuf> = dirs.into_iter().collect();
    let fingerprint = fingerprint_of(&dirs)?;
    log::debug!("Normalized {} candidate dirs -> {fingerprint}", dirs.len());

    Ok(NormalizedPaths { dirs, fingerprint })
}

/// Symlink-resolves `path` if it exists; otherwise returns it unchanged.
pub fn resolve_existing(path: &Path) -> PathBuf {
    if path.exists() {
        fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    } else {
        path.to_path_buf()
    }
}

/// Expands a leading `~` and `$VAR` / `${VAR}` / `%VAR%` tokens. Unset
/// variables expand to the empty string.
fn expand(raw: &str) -> String {
    static ENV_TOKEN: OnceLock<Regex> = OnceLock::new();
    let re = ENV_TOKEN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z0-9_]+)\}|\$([A-Za-z0-9_]+)|%([A-Za-z0-9_]+)%")
            .expect("static regex")
    });

    let mut s = raw.to_string();
    if s == "~" || s.starts_with("~/") || s.starts_with("~\\") {
        if let Some(home) = dirs::home_dir() {
            s = format!("{}{}", home.display(), &s[1..]);
        }
    }

    re.replace_all(&s, |caps: &regex::Captures| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        env::var(name).unwrap_or_default()
    })
    .into_owned()
}

fn fingerprint_of(dirs: &[PathBuf]) -> Result<Fingerprint> {
    let canonical: Vec<String> = dirs
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    let encoded = serde_json::to_vec(&canonical)?;

    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    Ok(Fingerprint(hex::encode(hasher.finalize())))
}
