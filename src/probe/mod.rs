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

//! Directory prober.
//!
//! Decides whether a directory is a valid JDK installation and extracts its
//! identifying metadata. Probing never errors: every failure mode is "not a
//! JDK here".

use crate::models::{Architecture, JdkExecutables, JdkRecord};
use crate::version::Version;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use std::sync::OnceLock;

/// Uniform probe contract used by the scan orchestrator.
pub trait JdkProber: Send + Sync {
    /// Returns the record for `dir`, or `None` when it is not a valid JDK.
    fn probe(&self, dir: &Path) -> Option<JdkRecord>;
}

/// Probes by checking for the four required executables and invoking
/// `javac -version` / `java -version`.
pub struct CommandProber;

impl JdkProber for CommandProber {
    fn probe(&self, dir: &Path) -> Option<JdkRecord> {
        if !dir.is_dir() {
            return None;
        }

        let path = crate::paths::resolve_existing(dir);
        let home = install_home(&path);
        let executables = locate_executables(&home)?;

        // A javac that cannot even run disqualifies the directory; output we
        // fail to parse merely leaves version/build unset.
        let javac_output = run_version_command(&executables.javac)?;
        let (version, build) = parse_javac_version(&javac_output)
            .map(|(v, b)| (Some(v), b))
            .unwrap_or((None, None));

        let architecture = run_version_command(&executables.java)
            .as_deref()
            .map(parse_architecture);

        log::debug!(
            "Probed JDK at {}: version={version:?} build={build:?} arch={architecture:?}",
            path.display()
        );

        Some(JdkRecord {
            path,
            version,
            build,
            architecture,
            executables,
            is_default: false,
        })
    }
}

/// Installation home holding `bin/`. On macOS a bundle keeps it under
/// `Contents/Home`.
fn install_home(dir: &Path) -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        let bundle = dir.join("Contents").join("Home");
        if bundle.join("bin").exists() {
            return bundle;
        }
    }
    dir.to_path_buf()
}

fn executable_name(tool: &str) -> String {
    if cfg!(windows) {
        format!("{tool}.exe")
    } else {
        tool.to_string()
    }
}

/// All four tools must be present for the directory to qualify.
fn locate_executables(home: &Path) -> Option<JdkExecutables> {
    let bin = home.join("bin");
    let mut found: Vec<PathBuf> = Vec::with_capacity(JdkExecutables::TOOLS.len());

    for tool in JdkExecutables::TOOLS {
        let candidate = bin.join(executable_name(tool));
        if !candidate.is_file() {
            log::trace!("Missing {tool} under {}", bin.display());
            return None;
        }
        found.push(crate::paths::resolve_existing(&candidate));
    }

    let mut it = found.into_iter();
    Some(JdkExecutables {
        java: it.next()?,
        javac: it.next()?,
        keytool: it.next()?,
        jarsigner: it.next()?,
    })
}

/// Runs `<tool> -version`, merging stdout and stderr (JDKs moved the output
/// stream between releases). `None` when the process cannot run or exits
/// non-zero.
fn run_version_command(tool: &Path) -> Option<String> {
    let output = Command::new(tool).arg("-version").output().ok()?;
    if !output.status.success() {
        return None;
    }

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push('\n');
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Some(text)
}

/// Parses the single supported `javac -version` convention:
/// `javac 1.8.0_92` yields version 1.8.0 and build 92; the underscore build
/// suffix is optional.
fn parse_javac_version(output: &str) -> Option<(Version, Option<u32>)> {
    static JAVAC_VERSION: OnceLock<Regex> = OnceLock::new();
    let re = JAVAC_VERSION
        .get_or_init(|| Regex::new(r"javac\s+(\d+(?:\.\d+)*)(?:_(\d+))?").expect("static regex"));

    let caps = re.captures(output)?;
    let version = Version::from_str(caps.get(1)?.as_str()).ok()?;
    let build = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
    Some((version, build))
}

/// `java -version` prints "64-Bit" in the VM banner of 64-bit builds.
fn parse_architecture(output: &str) -> Architecture {
    if output.contains("64-Bit") {
        Architecture::Bit64
    } else {
        Architecture::Bit32
    }
}
