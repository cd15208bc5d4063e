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

/// Shared test fixtures for creating fake JDK filesystem structures
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(unix)]
fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

/// Creates a fake JDK whose tools report `<version>_<build>`, e.g. 1.8.0_92.
///
/// # Returns
/// The path to the created installation directory
#[cfg(unix)]
#[allow(dead_code)]
pub fn create_fake_jdk(root: &Path, name: &str, version: &str, build: u32) -> PathBuf {
    let jdk_path = root.join(name);
    let bin = jdk_path.join("bin");
    fs::create_dir_all(&bin).unwrap();

    write_script(
        &bin.join("javac"),
        &format!("echo \"javac {version}_{build}\" 1>&2"),
    );
    write_script(
        &bin.join("java"),
        &format!(
            "echo 'openjdk version \"{version}_{build}\"' 1>&2\n\
             echo 'OpenJDK 64-Bit Server VM (build 25.92-b14, mixed mode)' 1>&2"
        ),
    );
    write_script(&bin.join("keytool"), "exit 0");
    write_script(&bin.join("jarsigner"), "exit 0");

    jdk_path
}

/// All four tools present, but javac cannot run successfully.
#[cfg(unix)]
#[allow(dead_code)]
pub fn create_broken_jdk(root: &Path, name: &str) -> PathBuf {
    let jdk_path = create_fake_jdk(root, name, "1.8.0", 92);
    write_script(&jdk_path.join("bin").join("javac"), "exit 1");
    jdk_path
}

/// A directory that looks nothing like a JDK.
#[allow(dead_code)]
pub fn create_incomplete_jdk(root: &Path, name: &str) -> PathBuf {
    let jdk_path = root.join(name);
    fs::create_dir_all(jdk_path.join("bin")).unwrap();
    fs::write(jdk_path.join("bin").join("java"), "not executable").unwrap();
    jdk_path
}
