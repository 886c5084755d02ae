//! Stage contract
//!
//! A stage is one independently applyable and deletable component of the
//! platform. The orchestrator only sees this trait; what a stage actually
//! does to the cluster is up to its implementation.

use crate::context::DeployContext;
use crate::error::BoxError;
use async_trait::async_trait;
use std::fmt;

/// Stage identity and position in the dependency order
///
/// The derived `Ord` is the install order: every variant depends only on
/// variants declared before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageKind {
    /// Cluster-wide resource definitions
    SchemaLayer,
    /// The platform's own operator
    PlatformOperator,
    /// Operator managing the metadata database (optional)
    DatabaseOperator,
    /// The system custom resource
    SystemInstance,
}

impl StageKind {
    pub const ALL: [StageKind; 4] = [
        StageKind::SchemaLayer,
        StageKind::PlatformOperator,
        StageKind::DatabaseOperator,
        StageKind::SystemInstance,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            StageKind::SchemaLayer => "CRD",
            StageKind::PlatformOperator => "Operator",
            StageKind::DatabaseOperator => "CloudNativePG Operator",
            StageKind::SystemInstance => "System",
        }
    }

    /// Whether configuration may leave this stage out of a plan
    pub fn is_optional(&self) -> bool {
        matches!(self, StageKind::DatabaseOperator)
    }

    /// Operators must be ready before the system instance is created
    pub fn gates_system(&self) -> bool {
        matches!(
            self,
            StageKind::PlatformOperator | StageKind::DatabaseOperator
        )
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Operation performed on a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageAction {
    Apply,
    Upgrade,
    Status,
    Delete,
    Render,
}

impl fmt::Display for StageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageAction::Apply => write!(f, "apply"),
            StageAction::Upgrade => write!(f, "upgrade"),
            StageAction::Status => write!(f, "status"),
            StageAction::Delete => write!(f, "delete"),
            StageAction::Render => write!(f, "render"),
        }
    }
}

/// One unit of the deployment
#[async_trait]
pub trait Stage: Send + Sync {
    /// Identity and dependency-order key
    fn kind(&self) -> StageKind;

    /// Create or update the stage's resources
    async fn apply(&self, ctx: &DeployContext) -> Result<(), BoxError>;

    /// Roll the stage forward to the configured versions
    async fn upgrade(&self, ctx: &DeployContext) -> Result<(), BoxError> {
        self.apply(ctx).await
    }

    /// Human readable status report
    async fn status(&self, ctx: &DeployContext) -> Result<String, BoxError>;

    /// Remove the stage's resources
    async fn delete(&self, ctx: &DeployContext) -> Result<(), BoxError>;

    /// Re-queries the cluster on every call; nothing is cached
    async fn is_ready(&self, ctx: &DeployContext) -> Result<bool, BoxError>;

    /// Manifests this stage would apply, if they can be produced offline
    async fn render(&self, _ctx: &DeployContext) -> Result<Option<String>, BoxError> {
        Ok(None)
    }
}

/// Read-only text report (versions, resource inventories)
#[async_trait]
pub trait Report: Send + Sync {
    fn title(&self) -> &str;

    async fn render(&self, ctx: &DeployContext) -> Result<String, BoxError>;
}
