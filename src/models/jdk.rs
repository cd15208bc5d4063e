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

use crate::error::{JdkScanError, Result};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// JVM bitness reported by `java -version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Architecture {
    #[serde(rename = "32bit")]
    Bit32,
    #[serde(rename = "64bit")]
    Bit64,
}

impl FromStr for Architecture {
    type Err = JdkScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "32bit" | "32" | "x86" => Ok(Architecture::Bit32),
            "64bit" | "64" | "x64" => Ok(Architecture::Bit64),
            _ => Err(JdkScanError::InvalidInput(format!(
                "Unknown architecture: {s}"
            ))),
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let arch = match self {
            Architecture::Bit32 => "32bit",
            Architecture::Bit64 => "64bit",
        };
        write!(f, "{arch}")
    }
}

/// Resolved absolute paths of the four executables every valid installation
/// must provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JdkExecutables {
    pub java: PathBuf,
    pub javac: PathBuf,
    pub keytool: PathBuf,
    pub jarsigner: PathBuf,
}

impl JdkExecutables {
    /// Logical tool names, in the order they are probed.
    pub const TOOLS: [&'static str; 4] = ["java", "javac", "keytool", "jarsigner"];

    pub fn get(&self, tool: &str) -> Option<&Path> {
        match tool {
            "java" => Some(&self.java),
            "javac" => Some(&self.javac),
            "keytool" => Some(&self.keytool),
            "jarsigner" => Some(&self.jarsigner),
            _ => None,
        }
    }
}

/// One detected JDK installation.
///
/// `version`, `build` and `architecture` are best-effort: extraction failures
/// leave them unset without invalidating the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JdkRecord {
    /// Absolute, symlink-resolved installation directory.
    pub path: PathBuf,
    pub version: Option<Version>,
    pub build: Option<u32>,
    pub architecture: Option<Architecture>,
    pub executables: JdkExecutables,
    pub is_default: bool,
}

impl JdkRecord {
    /// Identity key used to match records across rescans.
    ///
    /// Deliberately excludes `path`: the same logical JDK can surface at a
    /// different resolved location and must keep its subscriber bindings.
    pub fn key(&self) -> RecordKey {
        RecordKey {
            version: self.version.clone(),
            build: self.build,
        }
    }

    /// Full dedup key: no two records in a collection share this triple.
    pub fn dedup_key(&self) -> (Option<Version>, Option<u32>, Option<Architecture>) {
        (self.version.clone(), self.build, self.architecture)
    }
}

/// `(version, build)` identity of a record, used for subscriber continuity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub version: Option<Version>,
    pub build: Option<u32>,
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.version, self.build) {
            (Some(v), Some(b)) => write!(f, "{v}+{b}"),
            (Some(v), None) => write!(f, "{v}"),
            (None, Some(b)) => write!(f, "unknown+{b}"),
            (None, None) => write!(f, "unknown"),
        }
    }
}
