use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "config file {0} does not exist\n\nhint:\n  • check the path given in NBCTL_CONFIG or --config"
    )]
    ConfigFileMissing(PathBuf),

    #[error("invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
