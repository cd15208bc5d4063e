use thiserror::Error;

#[derive(Error, Debug)]
pub enum JdkScanError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid version format: {0}")]
    InvalidVersionFormat(String),

    #[error("Configuration file error: {0}")]
    ConfigFile(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to set up filesystem watch: {0}")]
    WatchSetup(String),

    #[error("Watch session failed: {0}")]
    WatchSession(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Notify(#[from] notify::Error),
}

pub type Result<T> = std::result::Result<T, JdkScanError>;
