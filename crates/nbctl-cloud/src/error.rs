//! Cloud provider error types

use std::time::Duration;
use thiserror::Error;

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    /// A submitted long-running operation ended in a failed terminal state
    #[error("{operation} failed: {detail}")]
    AsyncOperationFailed { operation: String, detail: String },

    #[error("{operation} did not finish within {}s", .waited.as_secs())]
    OperationTimeout { operation: String, waited: Duration },

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource already exists: {0}")]
    ResourceAlreadyExists(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CloudError {
    /// Deleting an absent resource is success-equivalent for callers that
    /// check this
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::ResourceNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
