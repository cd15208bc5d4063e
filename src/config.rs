use crate::error::{JdkScanError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_DEBOUNCE_MS: u64 = 300;
const DEFAULT_REGISTRY_POLL_SECS: u64 = 30;

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_registry_poll_secs() -> u64 {
    DEFAULT_REGISTRY_POLL_SECS
}

fn default_scan_subdirectories() -> bool {
    true
}

/// Engine tuning knobs. All fields have defaults so a missing or partial
/// config file is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Coalescing window for filesystem event bursts in watch mode.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Probe immediate subdirectories of a candidate that is not itself a
    /// JDK, for parent directories holding several installs.
    #[serde(default = "default_scan_subdirectories")]
    pub scan_subdirectories: bool,

    /// Re-resolution interval for candidate sources without native change
    /// notification (the Windows registry).
    #[serde(default = "default_registry_poll_secs")]
    pub registry_poll_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            scan_subdirectories: true,
            registry_poll_secs: DEFAULT_REGISTRY_POLL_SECS,
        }
    }
}

impl ScanConfig {
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            log::debug!("Config file not found at {config_path:?}, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: ScanConfig = toml::from_str(&contents)
            .map_err(|e| JdkScanError::ConfigFile(format!("Failed to parse config.toml: {e}")))?;

        if config.debounce_ms == 0 {
            return Err(JdkScanError::InvalidConfig(
                "debounce_ms must be greater than zero".to_string(),
            ));
        }

        log::debug!("Loaded config from {config_path:?}");
        Ok(config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn registry_poll_interval(&self) -> Duration {
        Duration::from_secs(self.registry_poll_secs)
    }
}
