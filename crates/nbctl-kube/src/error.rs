//! Cluster access error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KubeError {
    #[error("kubectl not found in PATH. Please install kubectl")]
    KubectlNotFound,

    #[error("kubectl {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Unexpected kubectl output: {0}")]
    UnexpectedOutput(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KubeError>;
