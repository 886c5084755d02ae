//! Azure provider error types

use nbctl_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AzureError {
    #[error("Failed to construct credential: {0}")]
    CredentialConstruction(String),

    #[error("Failed to acquire access token: {0}")]
    TokenAcquisition(String),

    #[error("No storage account keys returned for account {account}")]
    NoAccountKeys { account: String },

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AzureError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AzureError::Cloud(e) if e.is_not_found())
    }

    /// Configuration problems that retrying cannot fix
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AzureError::CredentialConstruction(_) | AzureError::NoAccountKeys { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AzureError>;
