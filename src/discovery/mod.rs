//! Candidate path discovery.
//!
//! Produces the platform-specific list of directories worth probing:
//! well-known installation roots, `JAVA_HOME`, and the JDK owning the `javac`
//! found on `PATH`. Every source is best-effort; a failing source contributes
//! no paths and never fails discovery as a whole.

use crate::scanner::DetectOptions;
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;

/// Ordered candidate directory strings for one detection request.
pub fn resolve_candidate_paths(opts: &DetectOptions) -> Vec<String> {
    let mut candidates: Vec<String> = opts.paths.clone().into_vec();

    if !opts.ignore_platform_paths {
        candidates.extend(platform_roots());

        if let Ok(java_home) = env::var("JAVA_HOME") {
            if !java_home.is_empty() {
                log::debug!("JAVA_HOME candidate: {java_home}");
                candidates.push(java_home);
            }
        }

        if let Some(dir) = javac_install_dir() {
            candidates.push(dir.to_string_lossy().into_owned());
        }
    }

    candidates
}

/// Whether the platform candidate sources must be re-resolved on a polling
/// interval in watch mode. True where installation roots come from the
/// registry, which emits no native filesystem events.
pub fn requires_polling() -> bool {
    cfg!(windows)
}

/// Well-known installation roots for the current OS. Parents holding several
/// JDKs are fine; the orchestrator expands one subdirectory level.
pub fn platform_roots() -> Vec<String> {
    #[cfg(target_os = "linux")]
    {
        vec![
            "/usr/lib/jvm".to_string(),
            "/usr/lib64/jvm".to_string(),
            "/usr/java".to_string(),
            "/opt/java".to_string(),
        ]
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            "/Library/Java/JavaVirtualMachines".to_string(),
            "/System/Library/Java/JavaVirtualMachines".to_string(),
            "~/Library/Java/JavaVirtualMachines".to_string(),
        ]
    }

    #[cfg(windows)]
    {
        // Registry-equivalent roots; re-resolved periodically in watch mode.
        ["ProgramFiles", "ProgramFiles(x86)", "ProgramW6432"]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .map(|root| format!("{root}\\Java"))
            .collect()
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
    {
        Vec::new()
    }
}

/// Installation directory owning the `javac` on `PATH`, if any.
fn javac_install_dir() -> Option<PathBuf> {
    let javac = which::which("javac").ok()?;
    let resolved = crate::paths::resolve_existing(&javac);
    // bin/javac -> installation root
    let dir = resolved.parent()?.parent()?.to_path_buf();
    log::debug!("PATH javac candidate: {}", dir.display());
    Some(dir)
}

/// Resolved, deduplicated set of directories on the executable search path,
/// used for default selection. Computed per invocation.
pub fn search_path_dirs() -> HashSet<PathBuf> {
    let Some(raw) = env::var_os("PATH") else {
        return HashSet::new();
    };

    env::split_paths(&raw)
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| crate::paths::resolve_existing(&p))
        .collect()
}
