use crate::stage::{StageAction, StageKind};
use std::time::Duration;
use thiserror::Error;

/// Error type crossing the stage collaborator seam
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("{stage} {action} failed: {source}")]
    StageFailed {
        stage: StageKind,
        action: StageAction,
        #[source]
        source: BoxError,
    },

    #[error(
        "{what} was not ready after {}s\n\nhint:\n  • inspect progress with: nbctl status\n  • raise readiness.timeout_secs in the settings file",
        .waited.as_secs()
    )]
    ReadinessTimeout { what: String, waited: Duration },

    #[error(
        "removing the cluster-wide resource definitions was declined\n\nhint:\n  • agree to remove them, or drop the --cleanup flag"
    )]
    ConfirmationDeclined,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    pub(crate) fn stage(stage: StageKind, action: StageAction, source: BoxError) -> Self {
        DeployError::StageFailed {
            stage,
            action,
            source,
        }
    }

    /// Timeouts are reported inline; every other error ends the run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DeployError::ReadinessTimeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
